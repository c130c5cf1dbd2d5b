//! Application router assembly.
//!
//! Kept separate from `main` so integration tests can drive the exact
//! route tree with an in-memory store, without the middleware stack or
//! a TCP listener.

use axum::Router;

use crate::routes;
use crate::state::AppState;

/// Build the full route tree with shared state applied.
pub fn app(state: AppState) -> Router {
    Router::new()
        // Health check at root level (not under /api/v1).
        .merge(routes::health::router())
        // API v1 routes.
        .nest("/api/v1", routes::api_routes())
        .with_state(state)
}
