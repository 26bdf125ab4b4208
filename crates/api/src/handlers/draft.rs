//! Handlers for the draft board review flow.
//!
//! A board is one document per spec; slide-level edits (layout hint,
//! move, appendix flag) and section approval all go through `If-Match`.
//! Approving a section locks every slide in it.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use deckgen_core::draft::DraftDocument;
use deckgen_core::CoreError;
use deckgen_store::DraftLogQuery;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::Caller;
use crate::middleware::precondition::IfMatch;
use crate::state::AppState;

/* --------------------------------------------------------------------------
Request types
-------------------------------------------------------------------------- */

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBoardRequest {
    #[validate(length(min = 1, max = 128))]
    pub spec_id: String,
    pub board: DraftDocument,
}

#[derive(Debug, Deserialize)]
pub struct SpecQuery {
    pub spec_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LayoutHintRequest {
    #[validate(length(min = 1, max = 128))]
    pub layout_hint: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MoveSlideRequest {
    #[validate(length(min = 1, max = 128))]
    pub target_section: String,
    pub position: usize,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AppendixRequest {
    pub appendix: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApproveSectionRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DraftLogsQuery {
    pub spec_id: String,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub action: Option<String>,
    pub since: Option<chrono::DateTime<chrono::Utc>>,
}

fn validation_error(err: validator::ValidationErrors) -> AppError {
    AppError::Core(CoreError::SchemaValidation(err.to_string()))
}

/* --------------------------------------------------------------------------
Handlers
-------------------------------------------------------------------------- */

/// POST /v1/draft/boards
///
/// Create the draft board for a spec. Responds 201 with the initial ETag.
pub async fn create_board(
    caller: Caller,
    State(state): State<AppState>,
    Json(input): Json<CreateBoardRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate().map_err(validation_error)?;

    let etag = state
        .draft
        .create_board(&input.spec_id, input.board, &caller.actor)?;

    tracing::info!(
        actor = %caller.actor,
        spec_id = %input.spec_id,
        "Draft board created"
    );

    Ok((
        StatusCode::CREATED,
        [(header::ETAG, etag.clone())],
        Json(json!({ "spec_id": input.spec_id, "etag": etag })),
    ))
}

/// GET /v1/draft/boards?spec_id=...
///
/// Fetch the board; the ETag rides both the header and the body.
pub async fn get_board(
    _caller: Caller,
    State(state): State<AppState>,
    Query(query): Query<SpecQuery>,
) -> AppResult<impl IntoResponse> {
    let (board, etag) = state.draft.get_board(&query.spec_id)?;
    Ok((
        [(header::ETAG, etag.clone())],
        Json(json!({ "board": board, "etag": etag })),
    ))
}

/// PATCH /v1/draft/slides/{slide_id}/hint?spec_id=...
///
/// Set a slide's layout hint; rejected with 423 once its section is
/// approved.
pub async fn update_layout_hint(
    caller: Caller,
    State(state): State<AppState>,
    Path(slide_id): Path<String>,
    Query(query): Query<SpecQuery>,
    IfMatch(etag): IfMatch,
    Json(input): Json<LayoutHintRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate().map_err(validation_error)?;

    let etag = state.draft.update_layout_hint(
        &query.spec_id,
        &slide_id,
        &input.layout_hint,
        input.notes,
        &etag,
        &caller.actor,
    )?;

    tracing::info!(
        actor = %caller.actor,
        spec_id = %query.spec_id,
        slide_id = %slide_id,
        layout_hint = %input.layout_hint,
        "Draft slide layout hint updated"
    );

    Ok(([(header::ETAG, etag.clone())], Json(json!({ "etag": etag }))))
}

/// POST /v1/draft/slides/{slide_id}/move?spec_id=...
///
/// Move a slide to a position inside a target section.
pub async fn move_slide(
    caller: Caller,
    State(state): State<AppState>,
    Path(slide_id): Path<String>,
    Query(query): Query<SpecQuery>,
    IfMatch(etag): IfMatch,
    Json(input): Json<MoveSlideRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate().map_err(validation_error)?;

    let etag = state.draft.move_slide(
        &query.spec_id,
        &slide_id,
        &input.target_section,
        input.position,
        &etag,
        &caller.actor,
        input.notes,
    )?;

    tracing::info!(
        actor = %caller.actor,
        spec_id = %query.spec_id,
        slide_id = %slide_id,
        target_section = %input.target_section,
        "Draft slide moved"
    );

    Ok(([(header::ETAG, etag.clone())], Json(json!({ "etag": etag }))))
}

/// POST /v1/draft/slides/{slide_id}/appendix?spec_id=...
///
/// Flag or unflag a slide as appendix material.
pub async fn set_appendix(
    caller: Caller,
    State(state): State<AppState>,
    Path(slide_id): Path<String>,
    Query(query): Query<SpecQuery>,
    IfMatch(etag): IfMatch,
    Json(input): Json<AppendixRequest>,
) -> AppResult<impl IntoResponse> {
    let etag = state.draft.set_appendix(
        &query.spec_id,
        &slide_id,
        input.appendix,
        &etag,
        &caller.actor,
        input.notes,
    )?;

    tracing::info!(
        actor = %caller.actor,
        spec_id = %query.spec_id,
        slide_id = %slide_id,
        appendix = input.appendix,
        "Draft slide appendix flag set"
    );

    Ok(([(header::ETAG, etag.clone())], Json(json!({ "etag": etag }))))
}

/// POST /v1/draft/sections/{section_name}/approve?spec_id=...
///
/// Approve a section; every slide in it becomes locked.
pub async fn approve_section(
    caller: Caller,
    State(state): State<AppState>,
    Path(section_name): Path<String>,
    Query(query): Query<SpecQuery>,
    IfMatch(etag): IfMatch,
    Json(input): Json<ApproveSectionRequest>,
) -> AppResult<impl IntoResponse> {
    let etag = state.draft.approve_section(
        &query.spec_id,
        &section_name,
        &etag,
        &caller.actor,
        input.notes,
    )?;

    tracing::info!(
        actor = %caller.actor,
        spec_id = %query.spec_id,
        section = %section_name,
        "Draft section approved"
    );

    Ok(([(header::ETAG, etag.clone())], Json(json!({ "etag": etag }))))
}

/// GET /v1/draft/logs?spec_id=...
///
/// Page through the board's audit log.
pub async fn list_logs(
    _caller: Caller,
    State(state): State<AppState>,
    Query(query): Query<DraftLogsQuery>,
) -> AppResult<impl IntoResponse> {
    let page = state.draft.list_logs(
        &query.spec_id,
        &DraftLogQuery {
            limit: query.limit,
            offset: query.offset,
            action: query.action,
            since: query.since,
        },
    )?;
    Ok(Json(page))
}
