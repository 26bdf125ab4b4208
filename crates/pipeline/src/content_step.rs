//! Content generation step: one draft card per spec slide.

use async_trait::async_trait;

use deckgen_ai::ContentAiOrchestrator;

use crate::context::PipelineContext;
use crate::step::PipelineStep;
use crate::PipelineError;

pub struct ContentGenerationStep {
    orchestrator: ContentAiOrchestrator,
    policy_id: Option<String>,
}

impl ContentGenerationStep {
    pub fn new(orchestrator: ContentAiOrchestrator, policy_id: Option<String>) -> Self {
        Self {
            orchestrator,
            policy_id,
        }
    }
}

#[async_trait]
impl PipelineStep for ContentGenerationStep {
    fn name(&self) -> &'static str {
        "content_ai"
    }

    async fn run(&self, context: &mut PipelineContext) -> Result<(), PipelineError> {
        let output = self
            .orchestrator
            .generate_document(context.spec(), self.policy_id.as_deref())
            .await?;
        context.publish("content_document", &output.document)?;
        context.publish("content_meta", &output.meta)?;
        context.publish("content_logs", &output.logs)?;
        Ok(())
    }
}
