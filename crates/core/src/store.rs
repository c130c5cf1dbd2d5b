//! The storage port for prompt records.
//!
//! Backends implement [`PromptStore`]; the only non-CRUD requirement is
//! [`PromptStore::transition`], which must apply the precondition check
//! and the status write as a single atomic step so that concurrent
//! deliveries cannot interleave between them.

use async_trait::async_trait;

use crate::prompt::{Prompt, PromptStatus};
use crate::types::{PromptId, Timestamp};

/// Errors from a storage backend.
///
/// Backends carry their own error types (e.g. `sqlx::Error`); they are
/// flattened to a message here so the port stays backend-agnostic.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// The mechanical field effect of a status write.
///
/// Each variant stamps `updated_at`; `Processing` additionally clears
/// `error_message`, `Completed` sets `output_text`, and `Failed` sets
/// `error_message`. The store applies these effects without knowing the
/// state machine; enforcing the transition graph is the lifecycle
/// service's job, via the `expected` precondition.
#[derive(Debug, Clone)]
pub enum StatusWrite {
    Processing,
    Completed { output: String },
    Failed { error: String },
}

impl StatusWrite {
    /// The status this write moves the prompt to.
    pub fn status(&self) -> PromptStatus {
        match self {
            Self::Processing => PromptStatus::Processing,
            Self::Completed { .. } => PromptStatus::Completed,
            Self::Failed { .. } => PromptStatus::Failed,
        }
    }
}

/// Result of a conditional status transition.
#[derive(Debug)]
pub enum TransitionOutcome {
    /// The write was applied; the updated record is returned.
    Applied(Prompt),
    /// No record exists for the id.
    NotFound,
    /// The record exists but its status did not match the expected
    /// precondition. Carries the status observed at the time of the
    /// attempt.
    Conflict { current: PromptStatus },
}

/// Durable storage for prompt records.
///
/// Pure record operations with no business logic. The API and worker
/// processes coordinate exclusively through an implementation of this
/// port (plus the submit queue).
#[async_trait]
pub trait PromptStore: Send + Sync {
    /// Persist a new record. The id must not already exist.
    async fn insert(&self, prompt: &Prompt) -> Result<(), StoreError>;

    /// Fetch a record by id.
    async fn find_by_id(&self, id: PromptId) -> Result<Option<Prompt>, StoreError>;

    /// All records, newest first (`created_at` descending).
    async fn list(&self) -> Result<Vec<Prompt>, StoreError>;

    /// Prompts still `Pending` that were created before `cutoff`.
    /// Used by the reconciliation sweep to find orphaned work.
    async fn list_pending_older_than(
        &self,
        cutoff: Timestamp,
    ) -> Result<Vec<Prompt>, StoreError>;

    /// Replace the prompt text, stamping `updated_at`. Returns the
    /// updated record, or `None` if the id is unknown.
    async fn update_text(
        &self,
        id: PromptId,
        text: &str,
    ) -> Result<Option<Prompt>, StoreError>;

    /// Remove a record. Returns whether anything was deleted.
    async fn delete(&self, id: PromptId) -> Result<bool, StoreError>;

    /// Conditionally apply a status write.
    ///
    /// When `expected` is `Some`, the write only happens if the current
    /// status matches; otherwise [`TransitionOutcome::Conflict`] is
    /// returned. The check and the write are atomic with respect to
    /// concurrent `transition` calls for the same id.
    async fn transition(
        &self,
        id: PromptId,
        expected: Option<PromptStatus>,
        write: StatusWrite,
    ) -> Result<TransitionOutcome, StoreError>;

    /// Cheap backend reachability probe for health reporting.
    async fn health_check(&self) -> Result<(), StoreError>;
}
