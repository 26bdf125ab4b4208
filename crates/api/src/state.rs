use std::sync::Arc;

use deckgen_store::{ContentStore, DraftStore};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// File-backed content card store.
    pub content: Arc<ContentStore>,
    /// File-backed draft board store.
    pub draft: Arc<DraftStore>,
    /// Server configuration (token check, timeouts).
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Build state with both stores rooted under the configured directory.
    pub fn from_config(config: ServerConfig) -> Self {
        Self {
            content: Arc::new(ContentStore::new(config.content_store_dir())),
            draft: Arc::new(DraftStore::new(config.draft_store_dir())),
            config: Arc::new(config),
        }
    }
}
