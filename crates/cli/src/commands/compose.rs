//! `compose`: spec plus approved content into the rendering-ready
//! document and the draft board proposal.
//!
//! Runs the validator and compose steps only; content comes from a
//! file instead of the generation step, so this is the path for decks
//! whose cards were reviewed by hand.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use serde::Deserialize;
use tracing::{info, warn};

use crate::commands::content::{read_review_log, warn_unlogged_approvals};

use deckgen_core::content::ContentApprovalDocument;
use deckgen_core::draft::DraftDocument;
use deckgen_core::rules::RulesConfig;
use deckgen_core::spec::JobSpec;
use deckgen_core::CoreError;
use deckgen_pipeline::{
    ComposeStep, PipelineContext, PipelineError, PipelineRunner, PipelineStep, SpecValidatorStep,
};

#[derive(Debug, Parser)]
pub struct ComposeArgs {
    /// Job spec (JSON).
    pub spec: PathBuf,

    /// Approved content document.
    #[arg(long)]
    pub content_approved: PathBuf,

    /// Review log cross-checked before composing (optional).
    #[arg(long)]
    pub content_review_log: Option<PathBuf>,

    /// layouts.jsonl from `layout-validate`; layout hints outside it
    /// are reported.
    #[arg(long)]
    pub layouts: Option<PathBuf>,

    /// Output path for the draft board proposal.
    #[arg(long, default_value = "draft_document.json")]
    pub draft_output: PathBuf,

    /// Working directory for generated files.
    #[arg(long, short = 'o', default_value = ".deckgen/compose")]
    pub output: PathBuf,

    /// Business rules file (defaults to the built-in limits).
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Template version stamped into the rendering-ready document.
    #[arg(long)]
    pub template_version: Option<String>,
}

fn load_rules(path: Option<&PathBuf>) -> Result<RulesConfig, CoreError> {
    match path {
        Some(path) => RulesConfig::from_file(path),
        None => Ok(RulesConfig::default()),
    }
}

#[derive(Debug, Deserialize)]
struct KnownLayout {
    id: String,
}

/// Layout ids from a `layouts.jsonl` file.
fn read_layout_ids(path: &std::path::Path) -> Result<Vec<String>, CoreError> {
    let source = std::fs::read_to_string(path).map_err(|e| {
        CoreError::SchemaValidation(format!("cannot read layouts {}: {e}", path.display()))
    })?;
    let mut ids = Vec::new();
    for line in source.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let layout: KnownLayout = serde_json::from_str(line)
            .map_err(|e| CoreError::SchemaValidation(format!("invalid layouts line: {e}")))?;
        ids.push(layout.id);
    }
    Ok(ids)
}

pub async fn compose(args: &ComposeArgs) -> Result<()> {
    let spec = JobSpec::from_file(&args.spec)?;
    let rules = load_rules(args.rules.as_ref())?;

    let source = std::fs::read_to_string(&args.content_approved).map_err(|e| {
        CoreError::SchemaValidation(format!(
            "cannot read content document {}: {e}",
            args.content_approved.display()
        ))
    })?;
    let content: ContentApprovalDocument = serde_json::from_str(&source)
        .map_err(|e| CoreError::SchemaValidation(format!("invalid content document JSON: {e}")))?;

    if let Some(log_path) = &args.content_review_log {
        let entries = read_review_log(log_path)?;
        warn_unlogged_approvals(&content, &entries);
    }
    if let Some(layouts_path) = &args.layouts {
        let known = read_layout_ids(layouts_path)?;
        for slide in &spec.slides {
            if !known.iter().any(|id| id == &slide.layout) {
                warn!(
                    slide_id = %slide.id,
                    layout = %slide.layout,
                    "spec layout is not in the validated layout set"
                );
            }
        }
    }

    let mut context = PipelineContext::new(spec, &args.output);
    context.publish("content_document", &content)?;

    let steps: Vec<Box<dyn PipelineStep>> = vec![
        Box::new(SpecValidatorStep::new(rules)),
        Box::new(ComposeStep::new(args.template_version.clone())),
    ];
    let runner = PipelineRunner::new(steps);
    runner
        .execute(&mut context)
        .await
        .map_err(PipelineError::into_core)?;

    let proposal: DraftDocument = context.require_as("draft_document")?;
    if let Some(parent) = args.draft_output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&args.draft_output, serde_json::to_vec_pretty(&proposal)?)?;

    let ready_path: String = context.require_as("generate_ready_path")?;
    info!(
        ready = %ready_path,
        draft = %args.draft_output.display(),
        "composition finished"
    );
    println!("{ready_path}");
    println!("{}", args.draft_output.display());
    Ok(())
}
