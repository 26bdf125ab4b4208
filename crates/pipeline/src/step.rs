//! Step trait and sequential runner.
//!
//! Steps run strictly in order; a failing step aborts the run. Nothing
//! here schedules background work.

use async_trait::async_trait;
use tracing::{error, info};

use crate::context::PipelineContext;
use crate::PipelineError;

#[async_trait]
pub trait PipelineStep: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, context: &mut PipelineContext) -> Result<(), PipelineError>;
}

pub struct PipelineRunner {
    steps: Vec<Box<dyn PipelineStep>>,
}

impl PipelineRunner {
    pub fn new(steps: Vec<Box<dyn PipelineStep>>) -> Self {
        Self { steps }
    }

    pub async fn execute(&self, context: &mut PipelineContext) -> Result<(), PipelineError> {
        for step in &self.steps {
            info!(step = step.name(), "step started");
            if let Err(err) = step.run(context).await {
                error!(step = step.name(), error = %err, "step failed");
                return Err(err);
            }
            info!(step = step.name(), "step finished");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use deckgen_core::spec::JobSpec;
    use deckgen_core::CoreError;

    struct Publish(&'static str);

    #[async_trait]
    impl PipelineStep for Publish {
        fn name(&self) -> &'static str {
            "publish"
        }

        async fn run(&self, context: &mut PipelineContext) -> Result<(), PipelineError> {
            context.publish(self.0, &true)?;
            Ok(())
        }
    }

    struct Require(&'static str);

    #[async_trait]
    impl PipelineStep for Require {
        fn name(&self) -> &'static str {
            "require"
        }

        async fn run(&self, context: &mut PipelineContext) -> Result<(), PipelineError> {
            context.require(self.0)?;
            Ok(())
        }
    }

    fn context() -> PipelineContext {
        let spec: JobSpec = serde_json::from_value(serde_json::json!({
            "meta": {"schema_version": "1.1", "title": "T"},
            "auth": {"created_by": "tester"},
            "slides": [{"id": "s1", "layout": "Title Slide"}]
        }))
        .unwrap();
        PipelineContext::new(spec, "/tmp")
    }

    #[tokio::test]
    async fn steps_run_in_order_and_share_artifacts() {
        let runner = PipelineRunner::new(vec![Box::new(Publish("flag")), Box::new(Require("flag"))]);
        let mut context = context();
        runner.execute(&mut context).await.unwrap();
    }

    #[tokio::test]
    async fn a_failing_step_aborts_the_run() {
        let runner = PipelineRunner::new(vec![Box::new(Require("absent")), Box::new(Publish("x"))]);
        let mut context = context();
        let err = runner.execute(&mut context).await.unwrap_err();
        assert_matches!(err, PipelineError::Domain(CoreError::ArtifactMissing(_)));
        assert!(!context.contains("x"));
    }
}
