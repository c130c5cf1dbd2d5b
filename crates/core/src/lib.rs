//! Domain layer for the promptdeck pipeline.
//!
//! This crate has zero internal workspace deps so it can be used by the
//! API, worker, and storage crates alike. It provides:
//!
//! - [`Prompt`] and [`PromptStatus`]: the single entity and its
//!   forward-only lifecycle state machine.
//! - [`PromptStore`]: the storage port every backend implements,
//!   including the conditional status transition that keeps concurrent
//!   deliveries safe.
//! - [`PromptService`]: the lifecycle service; the only component that
//!   is allowed to mutate a prompt's status.
//! - [`MemoryPromptStore`]: an in-process store for tests and for
//!   running without PostgreSQL.

pub mod error;
pub mod memory;
pub mod prompt;
pub mod service;
pub mod store;
pub mod types;

pub use error::CoreError;
pub use memory::MemoryPromptStore;
pub use prompt::{Prompt, PromptStatus};
pub use service::PromptService;
pub use store::{PromptStore, StatusWrite, StoreError, TransitionOutcome};
