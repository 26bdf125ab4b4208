//! File-backed review stores.
//!
//! Two stores share the same persistence shape: a per-spec directory
//! holding the resource JSON, an append-only `logs.jsonl`, and an
//! `index.json` with the revision counter. Mutations are optimistic:
//! callers present the ETag they last saw, and mismatches fail without
//! touching disk.

pub mod content;
pub mod draft;
pub mod etag;

use deckgen_core::CoreError;

/// Store-level error: domain failures plus persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] CoreError),
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StoreError {
    /// Collapse into the domain taxonomy for boundary mapping.
    pub fn into_core(self) -> CoreError {
        match self {
            StoreError::Domain(e) => e,
            StoreError::Io(e) => CoreError::Internal(e.to_string()),
            StoreError::Serde(e) => CoreError::Internal(e.to_string()),
        }
    }
}

pub use content::{
    ApproveOutcome, CardRecord, CardView, ContentStore, ContentUpdate, LogPage, LogQuery,
    UpdateOutcome,
};
pub use draft::{DraftLogPage, DraftLogQuery, DraftStore};
