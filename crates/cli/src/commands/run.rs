//! `run`: the unattended end-to-end pipeline.
//!
//! Validation, content generation, alignment, composition, audit,
//! analysis, auto-fix, polisher, monitoring, then the draft proposal
//! is persisted to the draft store so reviewers pick it up from the
//! board. Generated cards are auto-approved here; the interactive
//! review path goes through `content` and `compose` instead.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use tracing::info;

use deckgen_ai::matcher::MockSlideMatchClient;
use deckgen_ai::{create_llm_client, ContentAiOrchestrator, ContentAiPolicySet};
use deckgen_core::analyzer::AnalyzerOptions;
use deckgen_core::content::{CardStatus, ContentApprovalDocument};
use deckgen_core::draft::DraftDocument;
use deckgen_core::rules::RulesConfig;
use deckgen_core::spec::JobSpec;
use deckgen_core::CoreError;
use deckgen_pipeline::{
    AnalysisStep, AutoFixStep, ComposeStep, ContentGenerationStep, MonitoringStep,
    PipelineContext, PipelineError, PipelineRunner, PipelineStep, PolisherOptions, PolisherStep,
    RenderAuditStep, SlideAlignmentStep, SlideIdAligner, SlideIdAlignerOptions, SpecValidatorStep,
};
use deckgen_store::DraftStore;

#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Job spec (JSON).
    pub spec: PathBuf,

    /// Working directory for generated files and the local store.
    #[arg(long, default_value = ".deckgen/run")]
    pub workdir: PathBuf,

    /// Directory the final rendering-ready document is copied to.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Board id for the draft store (defaults to the spec file stem).
    #[arg(long)]
    pub spec_id: Option<String>,

    /// Brief document fed to the slide-ID aligner.
    #[arg(long)]
    pub brief: Option<PathBuf>,

    /// Content policy id within the policy set.
    #[arg(long)]
    pub policy: Option<String>,

    /// Policy set file (defaults to the built-in set).
    #[arg(long)]
    pub policy_file: Option<PathBuf>,

    /// Business rules file (defaults to the built-in limits).
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Template version stamped into the rendering-ready document.
    #[arg(long)]
    pub template_version: Option<String>,

    /// Run the external polisher after rendering.
    #[arg(long)]
    pub enable_polisher: bool,
}

/// Marks every generated card approved so composition can proceed in
/// an unattended run.
struct ContentApprovalStep;

#[async_trait]
impl PipelineStep for ContentApprovalStep {
    fn name(&self) -> &'static str {
        "content_approval"
    }

    async fn run(&self, context: &mut PipelineContext) -> Result<(), PipelineError> {
        let mut document: ContentApprovalDocument = context.require_as("content_document")?;
        for slide in &mut document.slides {
            slide.status = CardStatus::Approved;
        }
        info!(cards = document.slides.len(), "generated cards auto-approved");
        context.publish("content_document", &document)?;
        Ok(())
    }
}

fn spec_id_for(args: &RunArgs) -> String {
    args.spec_id.clone().unwrap_or_else(|| {
        args.spec
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "deck".to_string())
    })
}

fn load_rules(path: Option<&PathBuf>) -> Result<RulesConfig, CoreError> {
    match path {
        Some(path) => RulesConfig::from_file(path),
        None => Ok(RulesConfig::default()),
    }
}

fn load_policy_set(path: Option<&PathBuf>) -> Result<ContentAiPolicySet, CoreError> {
    match path {
        Some(path) => ContentAiPolicySet::from_file(path),
        None => Ok(ContentAiPolicySet::builtin()),
    }
}

pub async fn run(args: &RunArgs) -> Result<()> {
    let spec = JobSpec::from_file(&args.spec)?;
    let spec_id = spec_id_for(args);
    let rules = load_rules(args.rules.as_ref())?;
    let policy_set = load_policy_set(args.policy_file.as_ref())?;
    let llm = create_llm_client().map_err(CoreError::from)?;
    let orchestrator = ContentAiOrchestrator::new(policy_set, llm);
    let aligner = SlideIdAligner::new(
        SlideIdAlignerOptions::default(),
        Arc::new(MockSlideMatchClient),
    );

    let mut context = PipelineContext::new(spec, &args.workdir);
    if let Some(brief_path) = &args.brief {
        let source = std::fs::read_to_string(brief_path).map_err(|e| {
            CoreError::SchemaValidation(format!(
                "cannot read brief {}: {e}",
                brief_path.display()
            ))
        })?;
        let brief = deckgen_core::brief::BriefDocument::from_json(&source)?;
        context.publish("brief_document", &brief)?;
    }

    let steps: Vec<Box<dyn PipelineStep>> = vec![
        Box::new(SpecValidatorStep::new(rules)),
        Box::new(ContentGenerationStep::new(orchestrator, args.policy.clone())),
        Box::new(ContentApprovalStep),
        Box::new(SlideAlignmentStep::new(aligner)),
        Box::new(ComposeStep::new(args.template_version.clone())),
        Box::new(RenderAuditStep::new()),
        Box::new(AnalysisStep::new(AnalyzerOptions::default())),
        Box::new(AutoFixStep::new()),
        Box::new(PolisherStep::new(PolisherOptions {
            enabled: args.enable_polisher,
            ..PolisherOptions::default()
        })),
        Box::new(MonitoringStep::new()),
    ];
    let runner = PipelineRunner::new(steps);
    runner
        .execute(&mut context)
        .await
        .map_err(PipelineError::into_core)?;

    let proposal: DraftDocument = context.require_as("draft_document")?;
    let store = DraftStore::new(args.workdir.join("store/draft"));
    let etag = store
        .overwrite_board(&spec_id, proposal, "pipeline")
        .map_err(|e| e.into_core())?;

    let mut ready_path: String = context.require_as("generate_ready_path")?;
    if let Some(output) = &args.output {
        std::fs::create_dir_all(output)?;
        let target = output.join("generate_ready.json");
        std::fs::copy(&ready_path, &target)?;
        ready_path = target.display().to_string();
    }
    info!(spec_id = %spec_id, etag = %etag, "pipeline run finished");
    println!("{ready_path}");
    println!("board {spec_id} {etag}");
    Ok(())
}
