//! Health check handler.

use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::error::AppResult;

/// GET /health
///
/// Liveness check; reports the crate version so deployments are
/// identifiable from the outside.
pub async fn health_check() -> AppResult<impl IntoResponse> {
    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}
