use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use deckgen_core::CoreError;
use deckgen_store::StoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses
/// of the shape `{ "error": <message>, "code": <stable token> }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `deckgen-core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Core(err.into_core())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => (status_for(core), core.code(), render_message(core)),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map a domain error to its HTTP status.
///
/// - Schema/spec validation -> 422
/// - Revision mismatch (stale or missing `If-Match`) -> 412
/// - Locked resource -> 423
/// - Missing/invalid bearer token -> 401
/// - Unknown entity -> 404
/// - Duplicate create or unapproved cards -> 409
/// - Everything else -> 500
fn status_for(core: &CoreError) -> StatusCode {
    match core {
        CoreError::SchemaValidation(_) | CoreError::SpecValidation(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        CoreError::RevisionMismatch(_) => StatusCode::PRECONDITION_FAILED,
        CoreError::ResourceLocked(_) => StatusCode::LOCKED,
        CoreError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        CoreError::Conflict(_) | CoreError::MissingApproval(_) => StatusCode::CONFLICT,
        CoreError::Policy(_)
        | CoreError::LlmConfiguration(_)
        | CoreError::Polisher(_)
        | CoreError::ArtifactMissing(_)
        | CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Internal errors carry implementation detail that must not leak to
/// clients; everything else surfaces its display message verbatim.
fn render_message(core: &CoreError) -> String {
    match core {
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            "An internal error occurred".to_string()
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_error_taxonomy() {
        assert_eq!(
            status_for(&CoreError::RevisionMismatch(String::new())),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(
            status_for(&CoreError::ResourceLocked(String::new())),
            StatusCode::LOCKED
        );
        assert_eq!(
            status_for(&CoreError::Unauthorized(String::new())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(&CoreError::SchemaValidation(String::new())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&CoreError::NotFound { entity: "card", id: "x".into() }),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn internal_messages_are_sanitized() {
        let message = render_message(&CoreError::Internal("disk path /secret".into()));
        assert!(!message.contains("/secret"));
    }

    #[test]
    fn store_errors_collapse_into_the_domain_taxonomy() {
        let err: AppError = StoreError::Domain(CoreError::ResourceLocked("card".into())).into();
        match err {
            AppError::Core(CoreError::ResourceLocked(_)) => {}
            other => panic!("unexpected mapping: {other:?}"),
        }
    }
}
