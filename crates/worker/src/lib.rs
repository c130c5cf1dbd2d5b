//! Worker-side processing for the prompt pipeline.
//!
//! - [`PromptProcessor`]: the submission consumer, driving one prompt
//!   per delivery to a terminal state while tolerating redelivery.
//! - [`PendingSweeper`]: periodic reconciliation of prompts stuck in
//!   `Pending` (created but never published, or whose message was lost).
//! - [`WorkerConfig`]: environment configuration for the standalone
//!   worker binary.

pub mod config;
pub mod consumer;
pub mod sweep;

pub use config::WorkerConfig;
pub use consumer::PromptProcessor;
pub use sweep::PendingSweeper;
