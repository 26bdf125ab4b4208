//! Quality analysis and auto-fix payload synthesis.
//!
//! `AnalysisStep` runs the analyzer over the spec and writes
//! `analysis.json`; `AutoFixStep` turns that output into the versioned
//! review payload with per-slide grades and JSON-Patch proposals.

use async_trait::async_trait;
use tracing::info;

use deckgen_core::analyzer::{analyze, AnalysisDocument, AnalyzerOptions};
use deckgen_core::review::build_payload;

use crate::context::PipelineContext;
use crate::step::PipelineStep;
use crate::PipelineError;

pub struct AnalysisStep {
    options: AnalyzerOptions,
    output_filename: String,
}

impl AnalysisStep {
    pub fn new(options: AnalyzerOptions) -> Self {
        Self {
            options,
            output_filename: "analysis.json".to_string(),
        }
    }
}

#[async_trait]
impl PipelineStep for AnalysisStep {
    fn name(&self) -> &'static str {
        "analyzer"
    }

    async fn run(&self, context: &mut PipelineContext) -> Result<(), PipelineError> {
        let analysis = analyze(context.spec(), &self.options);

        let output_dir = context.workdir().join("outputs");
        std::fs::create_dir_all(&output_dir)?;
        let output_path = output_dir.join(&self.output_filename);
        std::fs::write(&output_path, serde_json::to_vec_pretty(&analysis)?)?;

        info!(
            issues = analysis.issues.len(),
            fixes = analysis.fixes.len(),
            path = %output_path.display(),
            "analysis completed"
        );
        context.publish("analysis", &analysis)?;
        context.publish("analysis_path", &output_path.display().to_string())?;
        Ok(())
    }
}

/// Converts the analyzer output into the review payload artifact.
pub struct AutoFixStep {
    output_filename: String,
}

impl Default for AutoFixStep {
    fn default() -> Self {
        Self {
            output_filename: "review_payload.json".to_string(),
        }
    }
}

impl AutoFixStep {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PipelineStep for AutoFixStep {
    fn name(&self) -> &'static str {
        "auto_fix"
    }

    async fn run(&self, context: &mut PipelineContext) -> Result<(), PipelineError> {
        let analysis: AnalysisDocument = context.require_as("analysis")?;
        let payload = build_payload(&analysis, context.spec());

        std::fs::create_dir_all(context.workdir())?;
        let output_path = context.workdir().join(&self.output_filename);
        std::fs::write(&output_path, serde_json::to_vec_pretty(&payload)?)?;

        info!(
            slides = payload.slides.len(),
            path = %output_path.display(),
            "review payload generated"
        );
        context.publish("review_payload", &payload)?;
        context.publish("review_payload_path", &output_path.display().to_string())?;
        Ok(())
    }
}
