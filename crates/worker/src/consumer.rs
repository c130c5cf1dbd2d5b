//! The submission consumer.
//!
//! One delivery attempt drives the referenced prompt toward a terminal
//! state:
//!
//! 1. Unknown prompt id: permanently unprocessable, acknowledged and
//!    dropped.
//! 2. Status is no longer `Pending`: a duplicate or concurrent
//!    delivery already advanced it; acknowledged with no side effects.
//! 3. `begin_processing`, the authoritative guard. Steps 1 and 2 are only
//!    a fast path; a race between them and the transition is settled by
//!    the store's atomic conditional update, so losing it here is the
//!    same normal outcome as step 2.
//! 4. The model call runs with no lock on the record.
//! 5. Success records the output via `complete`.
//! 6. Model failure is recorded via `fail`, then re-signalled to the
//!    queue so its redelivery policy applies. Because the machine is
//!    forward-only, that redelivery finds the prompt `Failed` and
//!    becomes a no-op; redelivery exists for faults that strike before
//!    the failure was recorded.

use std::sync::Arc;

use async_trait::async_trait;

use promptdeck_core::{CoreError, PromptService, PromptStatus};
use promptdeck_events::{HandlerError, SubmitPrompt, SubmitPromptHandler};
use promptdeck_llm::LlmClient;

/// [`SubmitPromptHandler`] orchestrating the lifecycle service and the
/// model client.
pub struct PromptProcessor {
    service: PromptService,
    llm: Arc<dyn LlmClient>,
}

impl PromptProcessor {
    pub fn new(service: PromptService, llm: Arc<dyn LlmClient>) -> Self {
        Self { service, llm }
    }
}

fn retriable(e: CoreError) -> HandlerError {
    HandlerError::new(e.to_string())
}

#[async_trait]
impl SubmitPromptHandler for PromptProcessor {
    async fn handle(&self, message: &SubmitPrompt) -> Result<(), HandlerError> {
        let id = message.prompt_id;
        tracing::debug!(prompt_id = %id, "Processing prompt");

        let prompt = match self.service.get(id).await {
            Ok(prompt) => prompt,
            Err(CoreError::NotFound { .. }) => {
                tracing::warn!(prompt_id = %id, "Prompt not found, dropping message");
                return Ok(());
            }
            // Storage faults are worth another delivery.
            Err(e) => return Err(retriable(e)),
        };

        if prompt.status != PromptStatus::Pending {
            tracing::info!(
                prompt_id = %id,
                status = %prompt.status,
                "Prompt already processed or in progress, ignoring delivery",
            );
            return Ok(());
        }

        match self.service.begin_processing(id).await {
            Ok(_) => {}
            Err(CoreError::InvalidTransition { from, .. }) => {
                // Lost the race to a concurrent delivery.
                tracing::info!(
                    prompt_id = %id,
                    status = %from,
                    "Prompt claimed by a concurrent delivery, ignoring",
                );
                return Ok(());
            }
            Err(CoreError::NotFound { .. }) => {
                tracing::warn!(prompt_id = %id, "Prompt deleted before processing began");
                return Ok(());
            }
            Err(e) => return Err(retriable(e)),
        }

        match self.llm.process(&prompt.text).await {
            Ok(output) => {
                self.service
                    .complete(id, &output)
                    .await
                    .map_err(retriable)?;
                tracing::info!(prompt_id = %id, "Prompt completed");
                Ok(())
            }
            Err(model_error) => {
                tracing::error!(
                    prompt_id = %id,
                    error = %model_error,
                    timed_out = model_error.is_timeout(),
                    "Model call failed",
                );

                if let Err(mark_error) = self.service.fail(id, &model_error.to_string()).await {
                    tracing::error!(
                        prompt_id = %id,
                        error = %mark_error,
                        "Failed to record prompt failure",
                    );
                }

                // Re-signal so the queue's redelivery policy applies.
                Err(HandlerError::new(model_error.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use promptdeck_core::MemoryPromptStore;
    use promptdeck_llm::LlmError;

    use super::*;

    /// Counts invocations; optionally sleeps (to widen race windows)
    /// and/or fails every call.
    struct CountingLlm {
        calls: AtomicU32,
        delay: Duration,
        failure: Option<LlmError>,
        response: String,
    }

    impl CountingLlm {
        fn ok(response: &str) -> Self {
            Self {
                calls: AtomicU32::new(0),
                delay: Duration::ZERO,
                failure: None,
                response: response.into(),
            }
        }

        fn failing(failure: LlmError) -> Self {
            Self {
                calls: AtomicU32::new(0),
                delay: Duration::ZERO,
                failure: Some(failure),
                response: String::new(),
            }
        }

        fn count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmClient for CountingLlm {
        async fn process(&self, _prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match &self.failure {
                Some(e) => Err(e.clone()),
                None => Ok(self.response.clone()),
            }
        }
    }

    fn pipeline(llm: Arc<CountingLlm>) -> (PromptService, PromptProcessor) {
        let service = PromptService::new(Arc::new(MemoryPromptStore::new()));
        let processor = PromptProcessor::new(service.clone(), llm);
        (service, processor)
    }

    #[tokio::test]
    async fn single_delivery_completes_the_prompt() {
        let llm = Arc::new(CountingLlm::ok("world"));
        let (service, processor) = pipeline(Arc::clone(&llm));

        let prompt = service.create("hello").await.unwrap();
        processor
            .handle(&SubmitPrompt::new(prompt.id))
            .await
            .unwrap();

        let done = service.get(prompt.id).await.unwrap();
        assert_eq!(done.status, PromptStatus::Completed);
        assert_eq!(done.output_text.as_deref(), Some("world"));
        assert_eq!(llm.count(), 1);
    }

    #[tokio::test]
    async fn duplicate_delivery_is_a_no_op() {
        let llm = Arc::new(CountingLlm::ok("once"));
        let (service, processor) = pipeline(Arc::clone(&llm));

        let prompt = service.create("hello").await.unwrap();
        let message = SubmitPrompt::new(prompt.id);

        processor.handle(&message).await.unwrap();
        processor.handle(&message).await.unwrap();

        // Exactly one model invocation and one terminal state.
        assert_eq!(llm.count(), 1);
        let done = service.get(prompt.id).await.unwrap();
        assert_eq!(done.status, PromptStatus::Completed);
    }

    #[tokio::test]
    async fn unknown_prompt_is_acknowledged_without_a_model_call() {
        let llm = Arc::new(CountingLlm::ok("unused"));
        let (_service, processor) = pipeline(Arc::clone(&llm));

        // Unknown id: acknowledged (Ok) so the queue never retries it.
        processor
            .handle(&SubmitPrompt::new(uuid::Uuid::new_v4()))
            .await
            .unwrap();

        assert_eq!(llm.count(), 0);
    }

    #[tokio::test]
    async fn model_failure_marks_failed_and_requests_redelivery() {
        let llm = Arc::new(CountingLlm::failing(LlmError::timeout(
            "request to the model service timed out",
        )));
        let (service, processor) = pipeline(Arc::clone(&llm));

        let prompt = service.create("x").await.unwrap();
        let result = processor.handle(&SubmitPrompt::new(prompt.id)).await;

        // The failure is re-signalled to the queue...
        assert!(result.is_err());

        // ...and recorded on the prompt.
        let failed = service.get(prompt.id).await.unwrap();
        assert_eq!(failed.status, PromptStatus::Failed);
        assert_eq!(
            failed.error_message.as_deref(),
            Some("request to the model service timed out")
        );
    }

    #[tokio::test]
    async fn redelivery_after_failure_is_a_no_op() {
        let llm = Arc::new(CountingLlm::failing(LlmError::timeout("timed out")));
        let (service, processor) = pipeline(Arc::clone(&llm));

        let prompt = service.create("x").await.unwrap();
        let message = SubmitPrompt::new(prompt.id);

        processor.handle(&message).await.unwrap_err();

        // The redelivery finds the prompt Failed (not Pending), so the
        // guard makes it a no-op rather than a second model invocation.
        processor.handle(&message).await.unwrap();

        assert_eq!(llm.count(), 1);
        let still_failed = service.get(prompt.id).await.unwrap();
        assert_eq!(still_failed.status, PromptStatus::Failed);
    }

    #[tokio::test]
    async fn concurrent_deliveries_invoke_the_model_once() {
        let llm = Arc::new(CountingLlm {
            calls: AtomicU32::new(0),
            // Keep the winner inside the model call while the loser
            // races through the guard.
            delay: Duration::from_millis(50),
            failure: None,
            response: "winner".into(),
        });
        let service = PromptService::new(Arc::new(MemoryPromptStore::new()));
        let processor = Arc::new(PromptProcessor::new(
            service.clone(),
            Arc::clone(&llm) as Arc<dyn LlmClient>,
        ));

        let prompt = service.create("contended").await.unwrap();
        let message = SubmitPrompt::new(prompt.id);

        let a = {
            let processor = Arc::clone(&processor);
            tokio::spawn(async move { processor.handle(&message).await })
        };
        let b = {
            let processor = Arc::clone(&processor);
            tokio::spawn(async move { processor.handle(&message).await })
        };

        // Both deliveries acknowledge cleanly.
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        assert_eq!(llm.count(), 1);
        let done = service.get(prompt.id).await.unwrap();
        assert_eq!(done.status, PromptStatus::Completed);
        assert_eq!(done.output_text.as_deref(), Some("winner"));
    }

    #[tokio::test]
    async fn prompt_deleted_mid_delivery_is_absorbed() {
        let llm = Arc::new(CountingLlm::ok("unused"));
        let (service, processor) = pipeline(Arc::clone(&llm));

        let prompt = service.create("vanishing").await.unwrap();
        service.delete(prompt.id).await.unwrap();

        processor
            .handle(&SubmitPrompt::new(prompt.id))
            .await
            .unwrap();
        assert_eq!(llm.count(), 0);
    }
}
