//! Route registration.
//!
//! `/health` lives at the root; everything else is nested under `/v1`
//! by the binary entrypoint.

pub mod content;
pub mod draft;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// All versioned API routes, to be nested under `/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/content", content::router())
        .nest("/draft", draft::router())
}
