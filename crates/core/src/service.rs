//! The prompt lifecycle service.
//!
//! The only component allowed to mutate a prompt's status. Both the
//! submission path (create) and the consumer path (the three transition
//! operations) go through this service; the HTTP layer never touches
//! status directly.
//!
//! Publishing the "process this prompt" message is deliberately NOT part
//! of [`PromptService::create`]; the submission path publishes after a
//! successful create, so creation and enqueue can be reasoned about and
//! tested independently.

use std::sync::Arc;

use crate::error::CoreError;
use crate::prompt::{Prompt, PromptStatus};
use crate::store::{PromptStore, StatusWrite, TransitionOutcome};
use crate::types::{PromptId, Timestamp};

/// Lifecycle service over an injected [`PromptStore`].
#[derive(Clone)]
pub struct PromptService {
    store: Arc<dyn PromptStore>,
}

impl PromptService {
    pub fn new(store: Arc<dyn PromptStore>) -> Self {
        Self { store }
    }

    /// Create a new `Pending` prompt and persist it.
    ///
    /// Rejects blank text. Has no side effect beyond persistence.
    pub async fn create(&self, text: &str) -> Result<Prompt, CoreError> {
        if text.trim().is_empty() {
            return Err(CoreError::Validation(
                "prompt text must not be blank".into(),
            ));
        }

        let prompt = Prompt::new(text);
        self.store.insert(&prompt).await?;

        tracing::info!(prompt_id = %prompt.id, "Created prompt");
        Ok(prompt)
    }

    pub async fn get(&self, id: PromptId) -> Result<Prompt, CoreError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(CoreError::NotFound { id })
    }

    /// All prompts, newest first.
    pub async fn list(&self) -> Result<Vec<Prompt>, CoreError> {
        Ok(self.store.list().await?)
    }

    /// Prompts stuck in `Pending` since before `cutoff`.
    pub async fn list_pending_older_than(
        &self,
        cutoff: Timestamp,
    ) -> Result<Vec<Prompt>, CoreError> {
        Ok(self.store.list_pending_older_than(cutoff).await?)
    }

    /// Pending -> Processing.
    ///
    /// Fails with [`CoreError::InvalidTransition`] unless the current
    /// status is exactly `Pending`. The store applies the precondition
    /// check and the write atomically, which is the authoritative guard
    /// against a redelivered message double-processing a prompt.
    /// Clears `error_message` and stamps `updated_at`.
    pub async fn begin_processing(&self, id: PromptId) -> Result<Prompt, CoreError> {
        self.apply(id, Some(PromptStatus::Pending), StatusWrite::Processing)
            .await
    }

    /// Processing -> Completed, recording the model output.
    ///
    /// The current status is not re-checked before completing; the
    /// only failure mode is `NotFound`.
    pub async fn complete(&self, id: PromptId, output: &str) -> Result<Prompt, CoreError> {
        self.apply(
            id,
            None,
            StatusWrite::Completed {
                output: output.to_string(),
            },
        )
        .await
    }

    /// Processing -> Failed, recording the error description.
    pub async fn fail(&self, id: PromptId, error: &str) -> Result<Prompt, CoreError> {
        self.apply(
            id,
            None,
            StatusWrite::Failed {
                error: error.to_string(),
            },
        )
        .await
    }

    /// Replace the prompt text (CRUD surface; status is untouched).
    pub async fn update_text(&self, id: PromptId, text: &str) -> Result<Prompt, CoreError> {
        if text.trim().is_empty() {
            return Err(CoreError::Validation(
                "prompt text must not be blank".into(),
            ));
        }

        self.store
            .update_text(id, text)
            .await?
            .ok_or(CoreError::NotFound { id })
    }

    /// Delete a prompt. Unconstrained by the state machine.
    pub async fn delete(&self, id: PromptId) -> Result<(), CoreError> {
        if self.store.delete(id).await? {
            tracing::info!(prompt_id = %id, "Deleted prompt");
            Ok(())
        } else {
            Err(CoreError::NotFound { id })
        }
    }

    /// Backend reachability, for health reporting.
    pub async fn store_healthy(&self) -> bool {
        self.store.health_check().await.is_ok()
    }

    async fn apply(
        &self,
        id: PromptId,
        expected: Option<PromptStatus>,
        write: StatusWrite,
    ) -> Result<Prompt, CoreError> {
        let target = write.status();
        match self.store.transition(id, expected, write).await? {
            TransitionOutcome::Applied(prompt) => {
                tracing::debug!(prompt_id = %id, status = %prompt.status, "Prompt transitioned");
                Ok(prompt)
            }
            TransitionOutcome::NotFound => Err(CoreError::NotFound { id }),
            TransitionOutcome::Conflict { current } => Err(CoreError::InvalidTransition {
                id,
                from: current,
                to: target,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use uuid::Uuid;

    use super::*;
    use crate::memory::MemoryPromptStore;

    fn service() -> PromptService {
        PromptService::new(Arc::new(MemoryPromptStore::new()))
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let service = service();

        let created = service.create("hello").await.unwrap();
        let fetched = service.get(created.id).await.unwrap();

        assert_eq!(fetched.status, PromptStatus::Pending);
        assert_eq!(fetched.text, "hello");
        assert!(fetched.output_text.is_none());
        assert!(fetched.error_message.is_none());
    }

    #[tokio::test]
    async fn create_rejects_blank_text() {
        let service = service();

        assert_matches!(service.create("").await, Err(CoreError::Validation(_)));
        assert_matches!(service.create("   ").await, Err(CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn get_unknown_id_is_not_found() {
        let service = service();
        let id = Uuid::new_v4();

        assert_matches!(
            service.get(id).await,
            Err(CoreError::NotFound { id: missing }) if missing == id
        );
    }

    #[tokio::test]
    async fn full_happy_path_reaches_completed() {
        let service = service();
        let prompt = service.create("hello").await.unwrap();

        service.begin_processing(prompt.id).await.unwrap();
        let done = service.complete(prompt.id, "world").await.unwrap();

        assert_eq!(done.status, PromptStatus::Completed);
        assert_eq!(done.output_text.as_deref(), Some("world"));
        assert!(done.updated_at.is_some());
    }

    #[tokio::test]
    async fn begin_processing_requires_pending() {
        let service = service();
        let prompt = service.create("once").await.unwrap();

        service.begin_processing(prompt.id).await.unwrap();

        // A second attempt loses the precondition check.
        let err = service.begin_processing(prompt.id).await.unwrap_err();
        assert_matches!(
            err,
            CoreError::InvalidTransition {
                from: PromptStatus::Processing,
                to: PromptStatus::Processing,
                ..
            }
        );

        // The prompt is untouched by the rejected attempt.
        let current = service.get(prompt.id).await.unwrap();
        assert_eq!(current.status, PromptStatus::Processing);
    }

    #[tokio::test]
    async fn begin_processing_rejected_from_terminal_states() {
        let service = service();

        let prompt = service.create("done").await.unwrap();
        service.begin_processing(prompt.id).await.unwrap();
        service.complete(prompt.id, "out").await.unwrap();
        assert_matches!(
            service.begin_processing(prompt.id).await,
            Err(CoreError::InvalidTransition {
                from: PromptStatus::Completed,
                ..
            })
        );

        let prompt = service.create("broken").await.unwrap();
        service.begin_processing(prompt.id).await.unwrap();
        service.fail(prompt.id, "model exploded").await.unwrap();
        assert_matches!(
            service.begin_processing(prompt.id).await,
            Err(CoreError::InvalidTransition {
                from: PromptStatus::Failed,
                ..
            })
        );
    }

    #[tokio::test]
    async fn complete_and_fail_on_unknown_id_are_not_found() {
        let service = service();
        let id = Uuid::new_v4();

        assert_matches!(
            service.complete(id, "output").await,
            Err(CoreError::NotFound { .. })
        );
        assert_matches!(
            service.fail(id, "error").await,
            Err(CoreError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn fail_records_the_most_recent_error() {
        let service = service();
        let prompt = service.create("x").await.unwrap();

        service.begin_processing(prompt.id).await.unwrap();
        let failed = service.fail(prompt.id, "request timed out").await.unwrap();

        assert_eq!(failed.status, PromptStatus::Failed);
        assert_eq!(failed.error_message.as_deref(), Some("request timed out"));
        assert!(failed.output_text.is_none());
    }

    #[tokio::test]
    async fn list_returns_newest_first() {
        let service = service();

        // Creation timestamps are `Utc::now()`; consecutive creates can
        // land on the same instant, so order by distinct waits.
        let first = service.create("first").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = service.create("second").await.unwrap();

        let all = service.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);
    }

    #[tokio::test]
    async fn update_text_stamps_and_preserves_status() {
        let service = service();
        let prompt = service.create("draft").await.unwrap();

        let updated = service.update_text(prompt.id, "final").await.unwrap();
        assert_eq!(updated.text, "final");
        assert_eq!(updated.status, PromptStatus::Pending);
        assert!(updated.updated_at.is_some());

        assert_matches!(
            service.update_text(Uuid::new_v4(), "nope").await,
            Err(CoreError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn delete_removes_the_record() {
        let service = service();
        let prompt = service.create("gone").await.unwrap();

        service.delete(prompt.id).await.unwrap();
        assert_matches!(
            service.get(prompt.id).await,
            Err(CoreError::NotFound { .. })
        );
        assert_matches!(
            service.delete(prompt.id).await,
            Err(CoreError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn concurrent_begin_processing_admits_exactly_one() {
        let service = service();
        let prompt = service.create("contended").await.unwrap();

        let (a, b) = tokio::join!(
            service.begin_processing(prompt.id),
            service.begin_processing(prompt.id),
        );

        let wins = [a.is_ok(), b.is_ok()].iter().filter(|w| **w).count();
        assert_eq!(wins, 1);

        let loser = if a.is_err() { a } else { b };
        assert_matches!(loser, Err(CoreError::InvalidTransition { .. }));
    }
}
