/// The single normalized model-call failure.
///
/// Carries a human-readable description (recorded on the prompt's
/// `error_message`) and a timeout marker for log fidelity. The consumer
/// treats every `LlmError` identically.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct LlmError {
    message: String,
    timed_out: bool,
}

impl LlmError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timed_out: false,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timed_out: true,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.timed_out
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::timeout("request to the model service timed out")
        } else if e.is_connect() {
            Self::new(format!("failed to reach the model service: {e}"))
        } else if e.is_decode() {
            Self::new(format!("failed to decode the model response: {e}"))
        } else {
            Self::new(format!("model request failed: {e}"))
        }
    }
}
