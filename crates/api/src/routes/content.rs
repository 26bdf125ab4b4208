//! Route definitions for the content card review flow.
//!
//! ```text
//! POST   /cards                     create_cards
//! GET    /cards                     list_cards
//! GET    /cards/{card_id}           get_card
//! PATCH  /cards/{card_id}           update_card
//! POST   /cards/{card_id}/approve   approve_card
//! POST   /cards/{card_id}/return    return_card
//! GET    /logs                      list_logs
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::content;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/cards",
            post(content::create_cards).get(content::list_cards),
        )
        .route(
            "/cards/{card_id}",
            get(content::get_card).patch(content::update_card),
        )
        .route("/cards/{card_id}/approve", post(content::approve_card))
        .route("/cards/{card_id}/return", post(content::return_card))
        .route("/logs", get(content::list_logs))
}
