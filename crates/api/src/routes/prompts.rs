//! Route definitions for the `/prompts` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::prompts;
use crate::state::AppState;

/// Routes mounted at `/prompts`.
///
/// ```text
/// GET    /       -> list_prompts
/// POST   /       -> create_prompt
/// GET    /{id}   -> get_prompt
/// PUT    /{id}   -> update_prompt
/// DELETE /{id}   -> delete_prompt
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(prompts::list_prompts).post(prompts::create_prompt))
        .route(
            "/{id}",
            get(prompts::get_prompt)
                .put(prompts::update_prompt)
                .delete(prompts::delete_prompt),
        )
}
