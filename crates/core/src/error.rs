use crate::prompt::PromptStatus;
use crate::store::StoreError;
use crate::types::PromptId;

/// Domain error taxonomy for the prompt pipeline.
///
/// `NotFound` and `InvalidTransition` are normal, expected outcomes:
/// during consumption they mean "someone already handled this" and are
/// absorbed without retry. Only `Storage` represents an actual fault.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Prompt not found: {id}")]
    NotFound { id: PromptId },

    #[error("Invalid transition for prompt {id}: {from} -> {to}")]
    InvalidTransition {
        id: PromptId,
        from: PromptStatus,
        to: PromptStatus,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}
