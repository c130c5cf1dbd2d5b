pub mod health;
pub mod prompts;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /prompts            GET list, POST create
/// /prompts/{id}       GET, PUT (text), DELETE
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/prompts", prompts::router())
}
