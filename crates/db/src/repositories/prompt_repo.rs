//! PostgreSQL implementation of the prompt store port.
//!
//! The conditional transition is a single `UPDATE ... WHERE id = $1
//! AND status = $expected RETURNING ...`. The row-level lock taken by
//! the `UPDATE` makes the precondition check and the write one atomic
//! step, so two concurrent deliveries for the same prompt cannot both
//! claim it.

use async_trait::async_trait;
use uuid::Uuid;

use promptdeck_core::{
    Prompt, PromptStatus, PromptStore, StatusWrite, StoreError, TransitionOutcome,
};

use crate::models::prompt::PromptRow;
use crate::DbPool;

/// Column list for `prompts` queries.
const COLUMNS: &str =
    "id, text, status, output_text, error_message, created_at, updated_at";

/// sqlx-backed [`PromptStore`].
pub struct PgPromptStore {
    pool: DbPool,
}

impl PgPromptStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl PromptStore for PgPromptStore {
    async fn insert(&self, prompt: &Prompt) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO prompts (id, text, status, created_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(prompt.id)
        .bind(&prompt.text)
        .bind(prompt.status.id())
        .bind(prompt.created_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Prompt>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM prompts WHERE id = $1");
        let row = sqlx::query_as::<_, PromptRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        row.map(Prompt::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<Prompt>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM prompts ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, PromptRow>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        rows.into_iter().map(Prompt::try_from).collect()
    }

    async fn list_pending_older_than(
        &self,
        cutoff: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<Prompt>, StoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM prompts \
             WHERE status = $1 AND created_at < $2 \
             ORDER BY created_at ASC"
        );
        let rows = sqlx::query_as::<_, PromptRow>(&query)
            .bind(PromptStatus::Pending.id())
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        rows.into_iter().map(Prompt::try_from).collect()
    }

    async fn update_text(&self, id: Uuid, text: &str) -> Result<Option<Prompt>, StoreError> {
        let query = format!(
            "UPDATE prompts SET text = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, PromptRow>(&query)
            .bind(id)
            .bind(text)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        row.map(Prompt::try_from).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM prompts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }

    async fn transition(
        &self,
        id: Uuid,
        expected: Option<PromptStatus>,
        write: StatusWrite,
    ) -> Result<TransitionOutcome, StoreError> {
        // Each variant has its own fixed field effect; the queries differ
        // only in which optional column they touch.
        let (set_clause, value): (&str, Option<String>) = match &write {
            StatusWrite::Processing => ("error_message = NULL", None),
            StatusWrite::Completed { output } => ("output_text = $3", Some(output.clone())),
            StatusWrite::Failed { error } => ("error_message = $3", Some(error.clone())),
        };

        let condition = if expected.is_some() {
            if value.is_some() {
                "id = $1 AND status = $4"
            } else {
                "id = $1 AND status = $3"
            }
        } else {
            "id = $1"
        };

        let query = format!(
            "UPDATE prompts SET status = $2, {set_clause}, updated_at = NOW() \
             WHERE {condition} \
             RETURNING {COLUMNS}"
        );

        let mut q = sqlx::query_as::<_, PromptRow>(&query)
            .bind(id)
            .bind(write.status().id());
        if let Some(value) = &value {
            q = q.bind(value);
        }
        if let Some(expected) = expected {
            q = q.bind(expected.id());
        }

        let row = q.fetch_optional(&self.pool).await.map_err(backend)?;

        if let Some(row) = row {
            return Ok(TransitionOutcome::Applied(Prompt::try_from(row)?));
        }

        // Zero rows: either the record is gone or the precondition did
        // not hold. A follow-up read distinguishes the two; the status it
        // observes is only advisory (the authoritative answer was the
        // conditional UPDATE itself).
        match self.find_by_id(id).await? {
            Some(current) => Ok(TransitionOutcome::Conflict {
                current: current.status,
            }),
            None => Ok(TransitionOutcome::NotFound),
        }
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await.map_err(backend)
    }
}
