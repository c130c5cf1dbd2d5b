//! Reconciliation of orphaned `Pending` prompts.
//!
//! A prompt can end up `Pending` with no message in flight: the publish
//! failed after creation, or a message was dead-lettered before any
//! attempt advanced the status. [`PendingSweeper`] periodically
//! republishes a `SubmitPrompt` for every such prompt older than a
//! minimum age. Republishing is safe; a duplicate message is stopped by
//! the consumer's idempotency guard.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use promptdeck_core::{CoreError, PromptService};
use promptdeck_events::{PromptQueue, PublishError, SubmitPrompt};

/// Background service that re-enqueues stale pending prompts.
pub struct PendingSweeper {
    service: PromptService,
    queue: PromptQueue,
    interval: Duration,
    min_age: Duration,
}

impl PendingSweeper {
    pub fn new(
        service: PromptService,
        queue: PromptQueue,
        interval: Duration,
        min_age: Duration,
    ) -> Self {
        Self {
            service,
            queue,
            interval,
            min_age,
        }
    }

    /// Run the sweep loop until `cancel` fires.
    ///
    /// The first tick happens after one full interval, so freshly
    /// published messages get a chance to be consumed first.
    pub async fn run(self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        interval.tick().await; // immediate first tick; skip it

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Pending sweeper cancelled");
                    break;
                }
                _ = interval.tick() => {
                    match self.sweep().await {
                        Ok(0) => {}
                        Ok(count) => {
                            tracing::info!(count, "Republished stale pending prompts");
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Pending sweep failed");
                        }
                    }
                }
            }
        }
    }

    /// One pass: republish every pending prompt older than `min_age`.
    /// Returns how many messages were republished.
    pub async fn sweep(&self) -> Result<usize, CoreError> {
        let cutoff =
            chrono::Utc::now() - chrono::Duration::seconds(self.min_age.as_secs() as i64);

        let stale = self.service.list_pending_older_than(cutoff).await?;
        let mut republished = 0;

        for prompt in &stale {
            match self.queue.publish(SubmitPrompt::new(prompt.id)) {
                Ok(()) => {
                    tracing::debug!(prompt_id = %prompt.id, "Republished pending prompt");
                    republished += 1;
                }
                Err(PublishError::Full) => {
                    // Back off; the rest will be picked up next pass.
                    tracing::warn!("Submit queue full during sweep, deferring remainder");
                    break;
                }
                Err(e @ PublishError::Closed) => {
                    tracing::warn!(error = %e, "Submit queue closed during sweep");
                    break;
                }
            }
        }

        Ok(republished)
    }
}
