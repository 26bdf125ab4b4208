//! The deck-authoring pipeline: context, step trait, runner, and the
//! standard steps (validation, content AI, slide-ID alignment,
//! composition, render audit, analysis, auto-fix, polisher, monitoring).

pub mod alignment;
pub mod analysis;
pub mod compose;
pub mod content_step;
pub mod context;
pub mod monitoring;
pub mod polisher;
pub mod render_audit;
pub mod step;
pub mod validator;

use deckgen_ai::LlmError;
use deckgen_core::CoreError;

pub use alignment::{
    AlignmentRecord, AlignmentStatus, SlideAlignmentStep, SlideIdAligner, SlideIdAlignerOptions,
};
pub use analysis::{AnalysisStep, AutoFixStep};
pub use compose::ComposeStep;
pub use content_step::ContentGenerationStep;
pub use context::PipelineContext;
pub use monitoring::MonitoringStep;
pub use polisher::{PolisherOptions, PolisherStep};
pub use render_audit::RenderAuditStep;
pub use step::{PipelineRunner, PipelineStep};
pub use validator::SpecValidatorStep;

/// Failures a pipeline step can surface.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl PipelineError {
    /// Collapse into the domain taxonomy for boundary mapping.
    pub fn into_core(self) -> CoreError {
        match self {
            PipelineError::Domain(err) => err,
            PipelineError::Llm(err) => err.into(),
            PipelineError::Io(err) => CoreError::Internal(err.to_string()),
            PipelineError::Serde(err) => CoreError::SchemaValidation(err.to_string()),
        }
    }
}
