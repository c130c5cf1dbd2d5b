//! Model client for the prompt pipeline.
//!
//! [`LlmClient`] is the capability the worker consumes: prompt text in,
//! generated text out. Every failure mode of the real backend (network,
//! timeout, bad status, undecodable or empty body) is normalized into a
//! single [`LlmError`] so the consumer never needs transport knowledge
//! to decide what to do: any error means "fail this attempt".
//!
//! [`OllamaClient`] talks to an Ollama server's `/api/generate`
//! endpoint; [`StaticLlmClient`] is the placeholder for running and
//! testing without a live model service.

pub mod client;
pub mod error;
pub mod ollama;

pub use client::{client_from_env, LlmClient, StaticLlmClient};
pub use error::LlmError;
pub use ollama::{OllamaClient, OllamaConfig};
