//! Bearer-token and actor extraction for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use deckgen_core::CoreError;

use crate::error::AppError;
use crate::state::AppState;

/// Default audit attribution when `X-Actor` is absent.
pub const DEFAULT_ACTOR: &str = "anonymous";

/// Authenticated caller extracted from the request headers.
///
/// When a `CONTENT_API_TOKEN` is configured, the `Authorization` header
/// must carry exactly that value as a Bearer token; otherwise the request
/// is rejected with 401. The `X-Actor` header attributes the mutation in
/// the audit log.
///
/// ```ignore
/// async fn my_handler(caller: Caller) -> AppResult<Json<()>> {
///     tracing::info!(actor = %caller.actor, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Caller {
    /// Audit attribution from `X-Actor`.
    pub actor: String,
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(expected) = &state.config.api_token {
            let auth_header = parts
                .headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    AppError::Core(CoreError::Unauthorized(
                        "Missing Authorization header".into(),
                    ))
                })?;

            let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Invalid Authorization format. Expected: Bearer <token>".into(),
                ))
            })?;

            if token != expected {
                return Err(AppError::Core(CoreError::Unauthorized(
                    "Invalid bearer token".into(),
                )));
            }
        }

        let actor = parts
            .headers
            .get("x-actor")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_ACTOR)
            .to_string();

        Ok(Caller { actor })
    }
}
