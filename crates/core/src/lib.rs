//! Domain model and pure logic for the deckgen authoring pipeline.
//!
//! This crate has no internal dependencies so it can be used by the
//! stores, the pipeline, the HTTP API, and CLI tooling alike.

pub mod analyzer;
pub mod brief;
pub mod content;
pub mod draft;
pub mod error;
pub mod hashing;
pub mod patch;
pub mod ready;
pub mod review;
pub mod rules;
pub mod spec;

pub use error::CoreError;
