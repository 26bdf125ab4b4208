//! Shared pipeline context.
//!
//! One context per run: the validated spec, a working directory for
//! generated files, and a bag of named artifacts steps publish for the
//! steps after them. Artifacts are stored as JSON values so the bag
//! stays uniform; typed accessors deserialize on demand.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use deckgen_core::spec::JobSpec;
use deckgen_core::CoreError;

pub struct PipelineContext {
    spec: JobSpec,
    workdir: PathBuf,
    artifacts: HashMap<String, Value>,
}

impl PipelineContext {
    pub fn new(spec: JobSpec, workdir: impl Into<PathBuf>) -> Self {
        Self {
            spec,
            workdir: workdir.into(),
            artifacts: HashMap::new(),
        }
    }

    /// The spec is immutable for the lifetime of a run.
    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Publish an artifact under `key`, replacing any previous value.
    pub fn publish<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), CoreError> {
        let value = serde_json::to_value(value)
            .map_err(|e| CoreError::Internal(format!("artifact '{key}' is not serializable: {e}")))?;
        debug!(key, "artifact published");
        self.artifacts.insert(key.to_string(), value);
        Ok(())
    }

    pub fn artifact(&self, key: &str) -> Option<&Value> {
        self.artifacts.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.artifacts.contains_key(key)
    }

    pub fn require(&self, key: &str) -> Result<&Value, CoreError> {
        self.artifacts
            .get(key)
            .ok_or_else(|| CoreError::ArtifactMissing(key.to_string()))
    }

    /// Required artifact deserialized into `T`.
    pub fn require_as<T: DeserializeOwned>(&self, key: &str) -> Result<T, CoreError> {
        let value = self.require(key)?;
        serde_json::from_value(value.clone())
            .map_err(|e| CoreError::Internal(format!("artifact '{key}' has the wrong shape: {e}")))
    }

    /// Optional artifact deserialized into `T`; wrong shapes read as absent.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.artifacts
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.artifacts.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn minimal_spec() -> JobSpec {
        serde_json::from_value(serde_json::json!({
            "meta": {"schema_version": "1.1", "title": "T"},
            "auth": {"created_by": "tester"},
            "slides": [{"id": "s1", "layout": "Title Slide"}]
        }))
        .unwrap()
    }

    #[test]
    fn missing_artifact_is_a_typed_error() {
        let context = PipelineContext::new(minimal_spec(), "/tmp");
        assert_matches!(
            context.require("rendering_log"),
            Err(CoreError::ArtifactMissing(key)) if key == "rendering_log"
        );
    }

    #[test]
    fn publish_then_require_round_trips() {
        let mut context = PipelineContext::new(minimal_spec(), "/tmp");
        context
            .publish("counts", &serde_json::json!({"applied": 2}))
            .unwrap();
        let value: Value = context.require_as("counts").unwrap();
        assert_eq!(value["applied"], 2);
    }

    #[test]
    fn remove_pops_the_artifact() {
        let mut context = PipelineContext::new(minimal_spec(), "/tmp");
        context.publish("pptx_path", &"/tmp/deck.pptx").unwrap();
        assert!(context.remove("pptx_path").is_some());
        assert!(context.remove("pptx_path").is_none());
    }
}
