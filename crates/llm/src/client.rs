//! The model client port and the fixed-response placeholder.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::ollama::{OllamaClient, OllamaConfig};

/// Capability that turns prompt text into generated text.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run one generation. Fails with a normalized [`LlmError`]
    /// regardless of the underlying cause.
    async fn process(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Placeholder client returning a fixed string.
///
/// Supports testing and running the pipeline without a live model
/// service.
pub struct StaticLlmClient {
    response: String,
}

impl StaticLlmClient {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

impl Default for StaticLlmClient {
    fn default() -> Self {
        Self::new("dummy result")
    }
}

#[async_trait]
impl LlmClient for StaticLlmClient {
    async fn process(&self, _prompt: &str) -> Result<String, LlmError> {
        Ok(self.response.clone())
    }
}

/// Build the client selected by the `LLM_PROVIDER` environment variable
/// (`ollama`, the default, or `static`).
///
/// Panics on unknown provider names; misconfiguration should fail at
/// startup, not at the first delivery.
pub fn client_from_env() -> Arc<dyn LlmClient> {
    let provider = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "ollama".into());
    match provider.as_str() {
        "ollama" => Arc::new(OllamaClient::new(OllamaConfig::from_env())),
        "static" => Arc::new(StaticLlmClient::default()),
        other => panic!("Unknown LLM_PROVIDER '{other}' (expected 'ollama' or 'static')"),
    }
}
