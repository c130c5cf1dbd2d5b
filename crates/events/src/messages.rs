use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Command to drive one prompt to a terminal state.
///
/// Exactly one of these is published per prompt (at creation), plus any
/// republications by the reconciliation sweep. Ordering between messages
/// for different prompts is not guaranteed and does not matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitPrompt {
    pub prompt_id: Uuid,
}

impl SubmitPrompt {
    pub fn new(prompt_id: Uuid) -> Self {
        Self { prompt_id }
    }
}
