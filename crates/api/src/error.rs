use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use promptdeck_core::CoreError;
use promptdeck_events::PublishError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent JSON
/// error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `promptdeck_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The submit queue rejected the message at publish time.
    #[error("Failed to queue prompt for processing: {0}")]
    Publish(#[from] PublishError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::NotFound { id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("Prompt with id {id} not found"),
                ),
                CoreError::InvalidTransition { id, from, to } => (
                    StatusCode::CONFLICT,
                    "INVALID_TRANSITION",
                    format!("Prompt {id} cannot move from {from} to {to}"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Storage(e) => {
                    tracing::error!(error = %e, "Storage error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // The prompt may already be persisted as Pending with no
            // message in flight; the reconciliation sweep picks it up.
            AppError::Publish(e) => {
                tracing::error!(error = %e, "Failed to publish submit-prompt message");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "QUEUE_UNAVAILABLE",
                    "Prompt processing is temporarily unavailable".to_string(),
                )
            }

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
