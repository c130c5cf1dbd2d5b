//! The prompt entity and its lifecycle state machine.
//!
//! Statuses are persisted as SMALLINT ids (1-based) and serialized as
//! lowercase strings on the wire. The state machine is forward-only:
//! `Completed` and `Failed` are terminal for the automated pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{PromptId, Timestamp};

/// Lifecycle status of a prompt.
///
/// Valid transitions:
///
/// ```text
/// Pending -> Processing -> Completed
///                       -> Failed
/// ```
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStatus {
    Pending = 1,
    Processing = 2,
    Completed = 3,
    Failed = 4,
}

impl PromptStatus {
    /// Return the SMALLINT id stored in the database.
    pub fn id(self) -> i16 {
        self as i16
    }

    /// Look up a status by its SMALLINT id.
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(Self::Pending),
            2 => Some(Self::Processing),
            3 => Some(Self::Completed),
            4 => Some(Self::Failed),
            _ => None,
        }
    }

    /// Check whether a transition from `self` to `to` follows the
    /// directed edges of the state machine.
    pub fn can_transition(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
        )
    }

    /// Terminal states admit no further automatic transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Lowercase name matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PromptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unit of work: user-submitted text plus its processing outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    /// Assigned at creation, immutable.
    pub id: PromptId,
    /// The submitted input text.
    pub text: String,
    pub status: PromptStatus,
    /// Set only on transition to `Completed`; never cleared.
    pub output_text: Option<String>,
    /// Reflects the most recent `Failed` transition; cleared when the
    /// prompt enters `Processing`.
    pub error_message: Option<String>,
    /// Set once at creation, immutable.
    pub created_at: Timestamp,
    /// Stamped on every mutation; `None` until the first one.
    pub updated_at: Option<Timestamp>,
}

impl Prompt {
    /// Build a fresh `Pending` prompt with a random id.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            status: PromptStatus::Pending,
            output_text: None,
            error_message: None,
            created_at: chrono::Utc::now(),
            updated_at: None,
        }
    }
}
