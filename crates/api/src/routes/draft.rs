//! Route definitions for the draft board review flow.
//!
//! ```text
//! POST   /boards                              create_board
//! GET    /boards                              get_board
//! PATCH  /slides/{slide_id}/hint              update_layout_hint
//! POST   /slides/{slide_id}/move              move_slide
//! POST   /slides/{slide_id}/appendix          set_appendix
//! POST   /sections/{section_name}/approve     approve_section
//! GET    /logs                                list_logs
//! ```

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::draft;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/boards", post(draft::create_board).get(draft::get_board))
        .route("/slides/{slide_id}/hint", patch(draft::update_layout_hint))
        .route("/slides/{slide_id}/move", post(draft::move_slide))
        .route("/slides/{slide_id}/appendix", post(draft::set_appendix))
        .route(
            "/sections/{section_name}/approve",
            post(draft::approve_section),
        )
        .route("/logs", get(draft::list_logs))
}
