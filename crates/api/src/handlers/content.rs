//! Handlers for the content card review flow.
//!
//! Cards are created in bulk per spec, edited and approved one at a
//! time under optimistic concurrency (`If-Match`), and every mutation
//! lands in the per-spec audit log.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use deckgen_core::content::{ContentSlide, ReviewAction};
use deckgen_core::CoreError;
use deckgen_store::{ContentUpdate, LogQuery};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::Caller;
use crate::middleware::precondition::IfMatch;
use crate::state::AppState;

/* --------------------------------------------------------------------------
Request types
-------------------------------------------------------------------------- */

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCardsRequest {
    #[validate(length(min = 1, max = 128))]
    pub spec_id: String,
    pub cards: Vec<ContentSlide>,
}

#[derive(Debug, Deserialize)]
pub struct SpecQuery {
    pub spec_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApproveRequest {
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub applied_autofix: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReturnRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContentLogsQuery {
    pub spec_id: String,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub action: Option<ReviewAction>,
    pub since: Option<chrono::DateTime<chrono::Utc>>,
}

fn validation_error(err: validator::ValidationErrors) -> AppError {
    AppError::Core(CoreError::SchemaValidation(err.to_string()))
}

/* --------------------------------------------------------------------------
Handlers
-------------------------------------------------------------------------- */

/// POST /v1/content/cards
///
/// Create the card set for a spec. Responds 201 with the initial ETag.
pub async fn create_cards(
    caller: Caller,
    State(state): State<AppState>,
    Json(input): Json<CreateCardsRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate().map_err(validation_error)?;

    let cards = input.cards.len();
    let etag = state
        .content
        .create(&input.spec_id, input.cards, &caller.actor)?;

    tracing::info!(
        actor = %caller.actor,
        spec_id = %input.spec_id,
        cards,
        "Content cards created"
    );

    Ok((
        StatusCode::CREATED,
        [(header::ETAG, etag.clone())],
        Json(json!({ "spec_id": input.spec_id, "cards": cards, "etag": etag })),
    ))
}

/// GET /v1/content/cards?spec_id=...
///
/// List all card records for a spec.
pub async fn list_cards(
    _caller: Caller,
    State(state): State<AppState>,
    Query(query): Query<SpecQuery>,
) -> AppResult<impl IntoResponse> {
    let records = state.content.list_cards(&query.spec_id)?;
    Ok(Json(json!({ "items": records })))
}

/// GET /v1/content/cards/{card_id}?spec_id=...
///
/// Fetch one card with its audit history; the ETag rides both the
/// header and the body.
pub async fn get_card(
    _caller: Caller,
    State(state): State<AppState>,
    Path(card_id): Path<String>,
    Query(query): Query<SpecQuery>,
) -> AppResult<impl IntoResponse> {
    let view = state.content.get(&query.spec_id, &card_id)?;
    Ok(([(header::ETAG, view.etag.clone())], Json(view)))
}

/// PATCH /v1/content/cards/{card_id}?spec_id=...
///
/// Update editable fields of a draft card under `If-Match`.
pub async fn update_card(
    caller: Caller,
    State(state): State<AppState>,
    Path(card_id): Path<String>,
    Query(query): Query<SpecQuery>,
    IfMatch(etag): IfMatch,
    Json(update): Json<ContentUpdate>,
) -> AppResult<impl IntoResponse> {
    let outcome = state
        .content
        .update(&query.spec_id, &card_id, update, &etag, &caller.actor)?;

    tracing::info!(
        actor = %caller.actor,
        spec_id = %query.spec_id,
        card_id = %card_id,
        revision = outcome.revision,
        "Content card updated"
    );

    Ok((
        [(header::ETAG, outcome.etag.clone())],
        Json(json!({
            "revision": outcome.revision,
            "content_hash": outcome.content_hash,
            "etag": outcome.etag,
        })),
    ))
}

/// POST /v1/content/cards/{card_id}/approve?spec_id=...
///
/// Approve a card; locks it against further updates.
pub async fn approve_card(
    caller: Caller,
    State(state): State<AppState>,
    Path(card_id): Path<String>,
    Query(query): Query<SpecQuery>,
    IfMatch(etag): IfMatch,
    Json(input): Json<ApproveRequest>,
) -> AppResult<impl IntoResponse> {
    let outcome = state.content.approve(
        &query.spec_id,
        &card_id,
        &etag,
        input.notes,
        input.applied_autofix,
        &caller.actor,
    )?;

    tracing::info!(
        actor = %caller.actor,
        spec_id = %query.spec_id,
        card_id = %card_id,
        revision = outcome.revision,
        "Content card approved"
    );

    Ok((
        [(header::ETAG, outcome.etag.clone())],
        Json(json!({
            "revision": outcome.revision,
            "status": outcome.status,
            "locked_at": outcome.locked_at,
            "etag": outcome.etag,
        })),
    ))
}

/// POST /v1/content/cards/{card_id}/return?spec_id=...
///
/// Send a card back to its author with a reason.
pub async fn return_card(
    caller: Caller,
    State(state): State<AppState>,
    Path(card_id): Path<String>,
    Query(query): Query<SpecQuery>,
    IfMatch(etag): IfMatch,
    Json(input): Json<ReturnRequest>,
) -> AppResult<impl IntoResponse> {
    let outcome = state
        .content
        .return_card(&query.spec_id, &card_id, &etag, input.reason, &caller.actor)?;

    tracing::info!(
        actor = %caller.actor,
        spec_id = %query.spec_id,
        card_id = %card_id,
        revision = outcome.revision,
        "Content card returned"
    );

    Ok((
        [(header::ETAG, outcome.etag.clone())],
        Json(json!({
            "revision": outcome.revision,
            "content_hash": outcome.content_hash,
            "etag": outcome.etag,
        })),
    ))
}

/// GET /v1/content/logs?spec_id=...
///
/// Page through the audit log; `action` and `since` filter, `limit` and
/// `offset` paginate.
pub async fn list_logs(
    _caller: Caller,
    State(state): State<AppState>,
    Query(query): Query<ContentLogsQuery>,
) -> AppResult<impl IntoResponse> {
    let page = state.content.list_logs(
        &query.spec_id,
        &LogQuery {
            limit: query.limit,
            offset: query.offset,
            action: query.action,
            since: query.since,
        },
    )?;
    Ok(Json(page))
}
