//! `content`: content approval document intake and the approval gate.
//!
//! Two modes. `--content-source` takes a hand-edited document, checks
//! every card against the element constraints, and writes the
//! normalized copy. `--content-approved` plus `--content-review-log`
//! runs the gate before composition: every card must be approved, and
//! the gate cross-checks the append-only review log from the store.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use deckgen_core::content::{
    CardStatus, ContentApprovalDocument, ContentReviewLogEntry, ReviewAction,
};
use deckgen_core::CoreError;

#[derive(Debug, Parser)]
pub struct ContentArgs {
    /// Content approval document to import and validate.
    #[arg(long, conflicts_with_all = ["content_approved", "content_review_log"])]
    pub content_source: Option<PathBuf>,

    /// Content approval document to gate (with `--content-review-log`).
    #[arg(long, requires = "content_review_log")]
    pub content_approved: Option<PathBuf>,

    /// Review log (JSON lines) backing the approvals.
    #[arg(long)]
    pub content_review_log: Option<PathBuf>,

    /// Output path for the accepted document.
    #[arg(long, short = 'o', default_value = "content_approval.json")]
    pub output: PathBuf,
}

fn read_document(path: &Path) -> Result<ContentApprovalDocument, CoreError> {
    let source = std::fs::read_to_string(path).map_err(|e| {
        CoreError::SchemaValidation(format!(
            "cannot read content document {}: {e}",
            path.display()
        ))
    })?;
    serde_json::from_str(&source)
        .map_err(|e| CoreError::SchemaValidation(format!("invalid content document JSON: {e}")))
}

pub(crate) fn read_review_log(path: &Path) -> Result<Vec<ContentReviewLogEntry>, CoreError> {
    let source = std::fs::read_to_string(path).map_err(|e| {
        CoreError::SchemaValidation(format!("cannot read review log {}: {e}", path.display()))
    })?;
    let mut entries = Vec::new();
    for line in source.lines() {
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(line).map_err(|e| {
            CoreError::SchemaValidation(format!("invalid review log line: {e}"))
        })?);
    }
    Ok(entries)
}

/// Element violations across the whole document, prefixed with the
/// offending card id.
fn document_violations(document: &ContentApprovalDocument) -> Vec<String> {
    let mut out = Vec::new();
    for slide in &document.slides {
        for violation in slide.elements.violations() {
            out.push(format!("{}: {violation}", slide.id));
        }
    }
    out
}

fn write_document(document: &ContentApprovalDocument, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(output, serde_json::to_vec_pretty(document)?)?;
    println!("{}", output.display());
    Ok(())
}

fn import(source: &Path, output: &Path) -> Result<()> {
    let document = read_document(source)?;
    let violations = document_violations(&document);
    if !violations.is_empty() {
        return Err(CoreError::SchemaValidation(violations.join("; ")).into());
    }
    info!(
        cards = document.slides.len(),
        path = %output.display(),
        "content document imported"
    );
    write_document(&document, output)
}

/// Warn about approved cards with no matching approve entry in the log.
pub(crate) fn warn_unlogged_approvals(
    document: &ContentApprovalDocument,
    entries: &[ContentReviewLogEntry],
) {
    let approved_in_log: HashSet<&str> = entries
        .iter()
        .filter(|entry| entry.action == ReviewAction::Approve)
        .map(|entry| entry.slide_id.as_str())
        .collect();
    for slide in &document.slides {
        if slide.status == CardStatus::Approved && !approved_in_log.contains(slide.id.as_str()) {
            warn!(card_id = %slide.id, "approved card has no approve entry in the review log");
        }
    }
}

fn gate(document_path: &Path, log_path: &Path, output: &Path) -> Result<()> {
    let document = read_document(document_path)?;
    document.ensure_all_approved()?;

    let entries = read_review_log(log_path)?;
    warn_unlogged_approvals(&document, &entries);

    info!(
        cards = document.slides.len(),
        log_entries = entries.len(),
        "approval gate passed"
    );
    write_document(&document, output)
}

pub fn content(args: &ContentArgs) -> Result<()> {
    match (
        &args.content_source,
        &args.content_approved,
        &args.content_review_log,
    ) {
        (Some(source), None, None) => import(source, &args.output),
        (None, Some(document), Some(log)) => gate(document, log, &args.output),
        _ => Err(CoreError::SchemaValidation(
            "pass either --content-source, or --content-approved with --content-review-log"
                .to_string(),
        )
        .into()),
    }
}
