//! HTTP client for an Ollama generation server.
//!
//! Wire contract: `POST {base_url}/api/generate` with
//! `{"model", "prompt", "stream": false}`, answered by a JSON object
//! whose `response` field carries the generated text.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::client::LlmClient;
use crate::error::LlmError;

/// Default Ollama endpoint for local development.
const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default model tag.
const DEFAULT_MODEL: &str = "llama3.2";

/// Default request timeout. Generation is slow; give it minutes.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Ollama connection settings loaded from environment variables.
///
/// | Env Var               | Default                  |
/// |-----------------------|--------------------------|
/// | `OLLAMA_BASE_URL`     | `http://localhost:11434` |
/// | `OLLAMA_MODEL`        | `llama3.2`               |
/// | `OLLAMA_TIMEOUT_SECS` | `300`                    |
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl OllamaConfig {
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());

        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());

        let timeout_secs: u64 = std::env::var("OLLAMA_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .expect("OLLAMA_TIMEOUT_SECS must be a valid u64");

        Self {
            base_url,
            model,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Request body for `POST /api/generate`.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// The fields of the generate response we care about.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

/// [`LlmClient`] over a single Ollama instance.
pub struct OllamaClient {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaClient {
    /// Build a client with its own connection pool and the configured
    /// request timeout.
    pub fn new(config: OllamaConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to build HTTP client");
        Self { client, config }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn process(&self, prompt: &str) -> Result<String, LlmError> {
        tracing::debug!(model = %self.config.model, "Sending prompt to Ollama");

        let body = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.config.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(LlmError::new(format!(
                "Ollama returned status {status}: {body}"
            )));
        }

        let parsed = response.json::<GenerateResponse>().await?;

        match parsed.response {
            Some(text) if !text.trim().is_empty() => {
                tracing::debug!("Received response from Ollama");
                Ok(text)
            }
            _ => Err(LlmError::new("Ollama returned an empty response")),
        }
    }
}
