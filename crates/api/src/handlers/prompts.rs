//! Handlers for the `/prompts` resource.
//!
//! This layer only ever calls the lifecycle service's public surface;
//! it never writes status itself. Creation and enqueue are two steps:
//! the service persists the prompt, then the handler publishes the
//! submit message. A publish failure surfaces as 503 while the prompt
//! stays `Pending` for the reconciliation sweep.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use promptdeck_events::SubmitPrompt;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for `POST /api/v1/prompts`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePrompt {
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub text: String,
}

/// Body for `PUT /api/v1/prompts/{id}`. Only the text is writable;
/// status belongs to the lifecycle service.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePrompt {
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub text: String,
}

/// POST /api/v1/prompts
///
/// Create a prompt and queue it for processing. Returns 201 with the
/// new `Pending` entity.
pub async fn create_prompt(
    State(state): State<AppState>,
    Json(input): Json<CreatePrompt>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let prompt = state.service.create(&input.text).await?;

    state.queue.publish(SubmitPrompt::new(prompt.id))?;
    tracing::info!(prompt_id = %prompt.id, "Prompt submitted for processing");

    Ok((StatusCode::CREATED, Json(DataResponse { data: prompt })))
}

/// GET /api/v1/prompts
///
/// List all prompts, newest first.
pub async fn list_prompts(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let prompts = state.service.list().await?;
    Ok(Json(DataResponse { data: prompts }))
}

/// GET /api/v1/prompts/{id}
pub async fn get_prompt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let prompt = state.service.get(id).await?;
    Ok(Json(DataResponse { data: prompt }))
}

/// PUT /api/v1/prompts/{id}
///
/// Update the prompt text. Does not touch status or re-queue.
pub async fn update_prompt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdatePrompt>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let prompt = state.service.update_text(id, &input.text).await?;
    Ok(Json(DataResponse { data: prompt }))
}

/// DELETE /api/v1/prompts/{id}
///
/// Delete a prompt in any status. Returns 204.
pub async fn delete_prompt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    state.service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
