use std::sync::Arc;

use promptdeck_core::PromptService;
use promptdeck_events::PromptQueue;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// The prompt lifecycle service, the only path to prompt state.
    pub service: PromptService,
    /// Publish side of the submit-prompt queue.
    pub queue: PromptQueue,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
