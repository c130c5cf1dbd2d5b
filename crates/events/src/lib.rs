//! Message transport between the submission path and the worker.
//!
//! Provides:
//!
//! - [`SubmitPrompt`]: the one message type, "process this prompt".
//! - [`PromptQueue`]: the publish side; publishing can fail and the
//!   submission path must handle that.
//! - [`QueueConsumer`]: the delivery loop. Delivery is at-least-once:
//!   a handler error triggers redelivery of the same message (with a
//!   delay) up to a bounded number of attempts, after which the message
//!   is dead-lettered. A message may therefore be delivered more than
//!   once and after arbitrary delay; consumers carry their own
//!   idempotency guard.

pub mod messages;
pub mod queue;

pub use messages::SubmitPrompt;
pub use queue::{
    HandlerError, PromptQueue, PublishError, QueueConsumer, QueueSettings, SubmitPromptHandler,
};
