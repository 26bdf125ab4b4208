//! `If-Match` extraction for mutating handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use deckgen_core::CoreError;

use crate::error::AppError;
use crate::state::AppState;

/// Required `If-Match` header carrying the ETag the caller last saw.
///
/// Every mutating store operation takes the expected ETag; a request
/// without one cannot pass the optimistic-concurrency check and is
/// rejected up front with 412.
#[derive(Debug, Clone)]
pub struct IfMatch(pub String);

impl FromRequestParts<AppState> for IfMatch {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let etag = parts
            .headers
            .get("if-match")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AppError::Core(CoreError::RevisionMismatch(
                    "Missing If-Match header".into(),
                ))
            })?;
        Ok(IfMatch(etag.to_string()))
    }
}
