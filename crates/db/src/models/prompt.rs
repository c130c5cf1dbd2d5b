//! Row mapping for the `prompts` table.

use sqlx::FromRow;
use uuid::Uuid;

use promptdeck_core::{Prompt, PromptStatus, StoreError};

/// A row from the `prompts` table. Status is stored as SMALLINT
/// (1 = pending, 2 = processing, 3 = completed, 4 = failed).
#[derive(Debug, Clone, FromRow)]
pub struct PromptRow {
    pub id: Uuid,
    pub text: String,
    pub status: i16,
    pub output_text: Option<String>,
    pub error_message: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl TryFrom<PromptRow> for Prompt {
    type Error = StoreError;

    fn try_from(row: PromptRow) -> Result<Self, Self::Error> {
        let status = PromptStatus::from_id(row.status).ok_or_else(|| {
            StoreError::Backend(format!(
                "prompt {} has unknown status id {}",
                row.id, row.status
            ))
        })?;

        Ok(Prompt {
            id: row.id,
            text: row.text,
            status,
            output_text: row.output_text,
            error_message: row.error_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
