//! End-of-run monitoring report and artifact cleanup.
//!
//! Writes `monitoring_report.json` when the rendering audit finished
//! without warnings, then removes transient PPTX artifacts from the
//! context and the filesystem. Cleanup runs even when the audit never
//! did, and tolerates files that are already gone.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use deckgen_core::analyzer::AnalysisDocument;

use crate::context::PipelineContext;
use crate::step::PipelineStep;
use crate::PipelineError;

pub struct MonitoringStep {
    output_filename: String,
}

impl Default for MonitoringStep {
    fn default() -> Self {
        Self {
            output_filename: "monitoring_report.json".to_string(),
        }
    }
}

impl MonitoringStep {
    pub fn new() -> Self {
        Self::default()
    }

    fn analyzer_summary(analysis: &AnalysisDocument) -> Value {
        let mut by_severity: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
        for issue in &analysis.issues {
            let severity = serde_json::to_value(issue.severity)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_else(|| "unknown".to_string());
            *by_severity.entry(severity).or_default() += 1;
            *by_type.entry(issue.issue_type.clone()).or_default() += 1;
        }
        json!({
            "total": analysis.issues.len(),
            "by_severity": by_severity,
            "by_type": by_type,
        })
    }

    fn cleanup(context: &mut PipelineContext) {
        if let Some(target) = context.remove("pdf_cleanup_pptx_path") {
            if let Some(path) = target.as_str() {
                match std::fs::remove_file(path) {
                    Ok(()) => info!(path, "removed transient PPTX"),
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                    Err(err) => warn!(path, error = %err, "could not remove transient PPTX"),
                }
            }
        }
        context.remove("pptx_path");
    }
}

#[async_trait]
impl PipelineStep for MonitoringStep {
    fn name(&self) -> &'static str {
        "monitoring"
    }

    async fn run(&self, context: &mut PipelineContext) -> Result<(), PipelineError> {
        let rendering_log = context.artifact("rendering_log").cloned();
        let result = match rendering_log {
            None => {
                warn!("monitoring report skipped: rendering_log is missing");
                Ok(())
            }
            Some(log) => self.write_report(context, &log),
        };
        Self::cleanup(context);
        result
    }
}

impl MonitoringStep {
    fn write_report(
        &self,
        context: &mut PipelineContext,
        rendering_log: &Value,
    ) -> Result<(), PipelineError> {
        let warnings_total = rendering_log["meta"]["warnings_total"].as_u64().unwrap_or(0);
        if warnings_total > 0 {
            warn!(warnings_total, "monitoring report skipped: audit has warnings");
            return Ok(());
        }

        let analyzer = context
            .get_as::<AnalysisDocument>("analysis")
            .map(|analysis| Self::analyzer_summary(&analysis));
        let report = json!({
            "generated_at": chrono::Utc::now(),
            "spec_meta": &context.spec().meta,
            "slides": context.spec().slides.len(),
            "rendering": {
                "warnings_total": warnings_total,
                "empty_placeholders": rendering_log["meta"]["empty_placeholders"].as_u64().unwrap_or(0),
            },
            "analyzer": analyzer,
            "pipeline": {
                "polisher": context.artifact("polisher_metadata"),
            },
        });

        std::fs::create_dir_all(context.workdir())?;
        let output_path = context.workdir().join(&self.output_filename);
        std::fs::write(&output_path, serde_json::to_vec_pretty(&report)?)?;

        let summary = json!({
            "alert_level": "ok",
            "headline": "No outstanding monitoring alerts",
            "rendering_warnings": warnings_total,
            "analyzer_issues": report["analyzer"]["total"].as_u64().unwrap_or(0),
        });
        info!(path = %output_path.display(), "monitoring report generated");
        context.publish("monitoring_report", &report)?;
        context.publish("monitoring_report_path", &output_path.display().to_string())?;
        context.publish("monitoring_summary", &summary)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckgen_core::spec::JobSpec;

    fn context(dir: &std::path::Path) -> PipelineContext {
        let spec: JobSpec = serde_json::from_value(serde_json::json!({
            "meta": {"schema_version": "1.1", "title": "T"},
            "auth": {"created_by": "tester"},
            "slides": [{"id": "s1", "layout": "Title Slide", "title": "T"}]
        }))
        .unwrap();
        PipelineContext::new(spec, dir)
    }

    #[tokio::test]
    async fn clean_audit_produces_a_report_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let pptx = dir.path().join("deck.pptx");
        std::fs::write(&pptx, b"stub").unwrap();

        let mut context = context(dir.path());
        context
            .publish(
                "rendering_log",
                &json!({"meta": {"warnings_total": 0, "empty_placeholders": 0}, "slides": []}),
            )
            .unwrap();
        context
            .publish("pptx_path", &pptx.display().to_string())
            .unwrap();
        context
            .publish("pdf_cleanup_pptx_path", &pptx.display().to_string())
            .unwrap();

        MonitoringStep::new().run(&mut context).await.unwrap();

        assert!(dir.path().join("monitoring_report.json").exists());
        assert!(!pptx.exists());
        assert!(!context.contains("pptx_path"));
        assert!(!context.contains("pdf_cleanup_pptx_path"));
        let summary = context.require("monitoring_summary").unwrap();
        assert_eq!(summary["alert_level"], "ok");
    }

    #[tokio::test]
    async fn cleanup_runs_without_a_rendering_log() {
        let dir = tempfile::tempdir().unwrap();
        let pptx = dir.path().join("deck.pptx");
        std::fs::write(&pptx, b"stub").unwrap();

        let mut context = context(dir.path());
        context
            .publish("pdf_cleanup_pptx_path", &pptx.display().to_string())
            .unwrap();
        context
            .publish("pptx_path", &pptx.display().to_string())
            .unwrap();

        MonitoringStep::new().run(&mut context).await.unwrap();

        assert!(!pptx.exists());
        assert!(!context.contains("pptx_path"));
        assert!(!dir.path().join("monitoring_report.json").exists());
    }

    #[tokio::test]
    async fn warnings_suppress_the_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut context = context(dir.path());
        context
            .publish(
                "rendering_log",
                &json!({"meta": {"warnings_total": 3, "empty_placeholders": 1}, "slides": []}),
            )
            .unwrap();
        MonitoringStep::new().run(&mut context).await.unwrap();
        assert!(!dir.path().join("monitoring_report.json").exists());
        assert!(!context.contains("monitoring_report"));
    }

    #[tokio::test]
    async fn cleanup_tolerates_missing_files_and_repeats() {
        let dir = tempfile::tempdir().unwrap();
        let mut context = context(dir.path());
        context
            .publish("pdf_cleanup_pptx_path", &"/nonexistent/deck.pptx")
            .unwrap();

        MonitoringStep::new().run(&mut context).await.unwrap();
        // second run is a no-op
        MonitoringStep::new().run(&mut context).await.unwrap();
        assert!(!context.contains("pdf_cleanup_pptx_path"));
    }
}
