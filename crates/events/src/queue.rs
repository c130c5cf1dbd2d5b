//! The submit-prompt queue.
//!
//! A bounded mpsc channel carries [`Delivery`] envelopes from the
//! publish side to a single consumer loop. Failed deliveries are
//! re-enqueued with an incremented attempt counter after a delay; once
//! the attempt budget is exhausted the message is dead-lettered (logged
//! and dropped). The loop exits when every publish handle is gone.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::messages::SubmitPrompt;

/// Default buffer capacity for the delivery channel.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Default number of delivery attempts per message (first try included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default pause before a failed delivery is re-enqueued.
pub const DEFAULT_REDELIVERY_DELAY: Duration = Duration::from_millis(500);

/// Tuning knobs for a queue pair.
#[derive(Debug, Clone)]
pub struct QueueSettings {
    pub capacity: usize,
    pub max_attempts: u32,
    pub redelivery_delay: Duration,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            redelivery_delay: DEFAULT_REDELIVERY_DELAY,
        }
    }
}

/// One delivery attempt of a published message.
#[derive(Debug, Clone)]
struct Delivery {
    message: SubmitPrompt,
    /// 1-based attempt counter.
    attempt: u32,
}

/// Publishing failed; the message was NOT handed to the consumer.
///
/// The submission path surfaces this to the caller; the prompt may then
/// exist as `Pending` with no message in flight, which the
/// reconciliation sweep later picks up.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("submit queue is full")]
    Full,
    #[error("submit queue is closed")]
    Closed,
}

/// A handler's request for redelivery.
///
/// Returning this from [`SubmitPromptHandler::handle`] leaves the
/// message unacknowledged; the queue applies its redelivery policy.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The registered message handler for the consumer loop.
#[async_trait]
pub trait SubmitPromptHandler: Send + Sync {
    /// Handle one delivery. `Ok` acknowledges the message; `Err` leaves
    /// it to the queue's redelivery policy.
    async fn handle(&self, message: &SubmitPrompt) -> Result<(), HandlerError>;
}

/// Publish side of the queue. Cheaply cloneable.
#[derive(Clone)]
pub struct PromptQueue {
    tx: mpsc::Sender<Delivery>,
}

impl PromptQueue {
    /// Create a queue and its paired consumer.
    pub fn new(settings: QueueSettings) -> (Self, QueueConsumer) {
        let (tx, rx) = mpsc::channel(settings.capacity);
        let consumer = QueueConsumer {
            rx,
            // A weak handle: redelivery must not keep the channel open
            // once every publisher is gone, or shutdown would hang.
            redeliver: tx.downgrade(),
            max_attempts: settings.max_attempts,
            redelivery_delay: settings.redelivery_delay,
        };
        (Self { tx }, consumer)
    }

    /// Hand a message to the queue for asynchronous delivery.
    pub fn publish(&self, message: SubmitPrompt) -> Result<(), PublishError> {
        self.tx
            .try_send(Delivery {
                message,
                attempt: 1,
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => PublishError::Full,
                mpsc::error::TrySendError::Closed(_) => PublishError::Closed,
            })
    }
}

/// The delivery loop. Consumes the queue until all publishers are gone.
pub struct QueueConsumer {
    rx: mpsc::Receiver<Delivery>,
    redeliver: mpsc::WeakSender<Delivery>,
    max_attempts: u32,
    redelivery_delay: Duration,
}

impl QueueConsumer {
    /// Run deliveries against `handler` until the channel closes.
    pub async fn run(mut self, handler: Arc<dyn SubmitPromptHandler>) {
        while let Some(delivery) = self.rx.recv().await {
            tracing::debug!(
                prompt_id = %delivery.message.prompt_id,
                attempt = delivery.attempt,
                "Delivering submit-prompt message",
            );

            match handler.handle(&delivery.message).await {
                Ok(()) => {}
                Err(error) => self.schedule_redelivery(delivery, &error),
            }
        }
        tracing::info!("Submit queue closed, consumer shutting down");
    }

    /// Re-enqueue a failed delivery, or dead-letter it when the attempt
    /// budget is spent.
    fn schedule_redelivery(&self, delivery: Delivery, error: &HandlerError) {
        let prompt_id = delivery.message.prompt_id;

        if delivery.attempt >= self.max_attempts {
            tracing::error!(
                %prompt_id,
                attempts = delivery.attempt,
                error = %error,
                "Dead-lettering submit-prompt message: delivery attempts exhausted",
            );
            return;
        }

        let Some(tx) = self.redeliver.upgrade() else {
            tracing::warn!(%prompt_id, "Queue closing, dropping redelivery");
            return;
        };

        tracing::warn!(
            %prompt_id,
            attempt = delivery.attempt,
            error = %error,
            "Delivery failed, scheduling redelivery",
        );

        let next = Delivery {
            message: delivery.message,
            attempt: delivery.attempt + 1,
        };
        let delay = self.redelivery_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(next).await.is_err() {
                tracing::warn!(%prompt_id, "Queue closed before redelivery");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use assert_matches::assert_matches;
    use uuid::Uuid;

    use super::*;

    /// Handler that fails its first `failures` invocations, then
    /// succeeds; every invocation is reported on the channel.
    struct FlakyHandler {
        failures: AtomicU32,
        calls: mpsc::UnboundedSender<Uuid>,
    }

    #[async_trait]
    impl SubmitPromptHandler for FlakyHandler {
        async fn handle(&self, message: &SubmitPrompt) -> Result<(), HandlerError> {
            self.calls.send(message.prompt_id).expect("test channel");
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                Err(HandlerError::new("transient failure"))
            } else {
                Ok(())
            }
        }
    }

    fn settings() -> QueueSettings {
        QueueSettings {
            capacity: 16,
            max_attempts: 3,
            redelivery_delay: Duration::from_millis(10),
        }
    }

    fn spawn_consumer(
        consumer: QueueConsumer,
        failures: u32,
    ) -> (mpsc::UnboundedReceiver<Uuid>, tokio::task::JoinHandle<()>) {
        let (calls_tx, calls_rx) = mpsc::unbounded_channel();
        let handler = Arc::new(FlakyHandler {
            failures: AtomicU32::new(failures),
            calls: calls_tx,
        });
        let handle = tokio::spawn(consumer.run(handler));
        (calls_rx, handle)
    }

    async fn recv_within(rx: &mut mpsc::UnboundedReceiver<Uuid>, ms: u64) -> Option<Uuid> {
        tokio::time::timeout(Duration::from_millis(ms), rx.recv())
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn publish_delivers_to_the_handler() {
        let (queue, consumer) = PromptQueue::new(settings());
        let (mut calls, _handle) = spawn_consumer(consumer, 0);

        let id = Uuid::new_v4();
        queue.publish(SubmitPrompt::new(id)).unwrap();

        assert_eq!(recv_within(&mut calls, 500).await, Some(id));
    }

    #[tokio::test]
    async fn failed_delivery_is_retried_until_success() {
        let (queue, consumer) = PromptQueue::new(settings());
        // Two failures, success on the third attempt (within budget).
        let (mut calls, _handle) = spawn_consumer(consumer, 2);

        let id = Uuid::new_v4();
        queue.publish(SubmitPrompt::new(id)).unwrap();

        for _ in 0..3 {
            assert_eq!(recv_within(&mut calls, 500).await, Some(id));
        }
        // No fourth delivery: the third attempt succeeded.
        assert_eq!(recv_within(&mut calls, 100).await, None);
    }

    #[tokio::test]
    async fn exhausted_attempts_dead_letter_the_message() {
        let (queue, consumer) = PromptQueue::new(settings());
        // Always failing: delivered exactly max_attempts times.
        let (mut calls, _handle) = spawn_consumer(consumer, u32::MAX);

        let id = Uuid::new_v4();
        queue.publish(SubmitPrompt::new(id)).unwrap();

        for _ in 0..3 {
            assert_eq!(recv_within(&mut calls, 500).await, Some(id));
        }
        assert_eq!(recv_within(&mut calls, 100).await, None);

        // The queue itself stays usable for other messages.
        let other = Uuid::new_v4();
        queue.publish(SubmitPrompt::new(other)).unwrap();
        assert_eq!(recv_within(&mut calls, 500).await, Some(other));
    }

    #[tokio::test]
    async fn publish_fails_when_the_buffer_is_full() {
        let (queue, _consumer) = PromptQueue::new(QueueSettings {
            capacity: 1,
            ..settings()
        });
        // No consumer running: the single buffer slot fills immediately.
        queue.publish(SubmitPrompt::new(Uuid::new_v4())).unwrap();

        assert_matches!(
            queue.publish(SubmitPrompt::new(Uuid::new_v4())),
            Err(PublishError::Full)
        );
    }

    #[tokio::test]
    async fn publish_fails_once_the_consumer_is_gone() {
        let (queue, consumer) = PromptQueue::new(settings());
        drop(consumer);

        assert_matches!(
            queue.publish(SubmitPrompt::new(Uuid::new_v4())),
            Err(PublishError::Closed)
        );
    }

    #[tokio::test]
    async fn consumer_shuts_down_when_all_publishers_drop() {
        let (queue, consumer) = PromptQueue::new(settings());
        let (_calls, handle) = spawn_consumer(consumer, 0);

        drop(queue);

        tokio::time::timeout(Duration::from_millis(500), handle)
            .await
            .expect("consumer should exit after the last publisher drops")
            .unwrap();
    }
}
