//! Wrapper around an external deck post-processing executable.
//!
//! The executable receives the PPTX path (and optionally a rules file)
//! through `{pptx}` / `{rules}` argument placeholders and is bounded by
//! a wall-clock timeout; on expiry the child is killed.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::process::Command;
use tracing::{debug, info};

use deckgen_core::CoreError;

use crate::context::PipelineContext;
use crate::step::PipelineStep;
use crate::PipelineError;

pub const EXECUTABLE_ENV: &str = "POLISHER_EXECUTABLE";
pub const EXECUTABLE_PATH_ENV: &str = "POLISHER_PATH";

#[derive(Debug, Clone)]
pub struct PolisherOptions {
    pub enabled: bool,
    pub executable: Option<PathBuf>,
    pub rules_path: Option<PathBuf>,
    pub timeout_sec: u64,
    pub arguments: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl Default for PolisherOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            executable: None,
            rules_path: None,
            timeout_sec: 90,
            arguments: Vec::new(),
            working_dir: None,
        }
    }
}

pub struct PolisherStep {
    options: PolisherOptions,
}

impl PolisherStep {
    pub fn new(options: PolisherOptions) -> Self {
        Self { options }
    }

    /// Program tokens for the configured executable. A `.dll` runs
    /// under `dotnet`.
    fn resolve_executable(&self) -> Result<Vec<String>, CoreError> {
        let candidate = self
            .options
            .executable
            .clone()
            .or_else(|| std::env::var(EXECUTABLE_ENV).ok().map(PathBuf::from))
            .or_else(|| std::env::var(EXECUTABLE_PATH_ENV).ok().map(PathBuf::from))
            .ok_or_else(|| {
                CoreError::Polisher("no polisher executable configured".to_string())
            })?;

        if !candidate.exists() {
            return Err(CoreError::Polisher(format!(
                "polisher executable not found: {}",
                candidate.display()
            )));
        }
        if candidate
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("dll"))
            .unwrap_or(false)
        {
            Ok(vec![
                "dotnet".to_string(),
                candidate.display().to_string(),
            ])
        } else {
            Ok(vec![candidate.display().to_string()])
        }
    }

    /// Final argument list with `{pptx}` / `{rules}` substituted. The
    /// defaults `--input {pptx}` and `--rules {rules}` are appended when
    /// the template omits the placeholder.
    fn prepare_arguments(&self, pptx_path: &str) -> Vec<String> {
        let mut args = self.options.arguments.clone();
        if !args.iter().any(|arg| arg.contains("{pptx}")) {
            args.push("--input".to_string());
            args.push("{pptx}".to_string());
        }
        let rules = self
            .options
            .rules_path
            .as_ref()
            .map(|path| path.display().to_string());
        if rules.is_some() && !args.iter().any(|arg| arg.contains("{rules}")) {
            args.push("--rules".to_string());
            args.push("{rules}".to_string());
        }

        args.into_iter()
            .map(|arg| {
                let arg = arg.replace("{pptx}", pptx_path);
                match &rules {
                    Some(rules) => arg.replace("{rules}", rules),
                    None => arg,
                }
            })
            .filter(|arg| !arg.is_empty())
            .collect()
    }
}

#[async_trait]
impl PipelineStep for PolisherStep {
    fn name(&self) -> &'static str {
        "polisher"
    }

    async fn run(&self, context: &mut PipelineContext) -> Result<(), PipelineError> {
        if !self.options.enabled {
            debug!("polisher is disabled");
            context.publish(
                "polisher_metadata",
                &json!({"status": "disabled", "enabled": false}),
            )?;
            return Ok(());
        }

        let pptx_path: String = context.require_as("pptx_path")?;
        if !std::path::Path::new(&pptx_path).exists() {
            return Err(CoreError::Polisher(format!("PPTX file not found: {pptx_path}")).into());
        }

        let program = self.resolve_executable()?;
        let args = self.prepare_arguments(&pptx_path);
        let mut command_line: Vec<String> = program.clone();
        command_line.extend(args.iter().cloned());
        info!(command = %command_line.join(" "), "running polisher");

        let mut command = Command::new(&program[0]);
        command
            .args(&program[1..])
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.options.working_dir {
            command.current_dir(dir);
        }

        let start = Instant::now();
        let wait = tokio::time::timeout(
            Duration::from_secs(self.options.timeout_sec),
            command.output(),
        )
        .await;
        let elapsed = start.elapsed().as_secs_f64();

        let output = match wait {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                return Err(CoreError::Polisher(format!("polisher failed to start: {err}")).into())
            }
            // On expiry the child is dropped and killed.
            Err(_) => {
                return Err(CoreError::Polisher(format!(
                    "polisher timed out after {}s",
                    self.options.timeout_sec
                ))
                .into())
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(CoreError::Polisher(format!(
                "polisher exited with {:?}.\nstdout:\n{stdout}\nstderr:\n{stderr}",
                output.status.code()
            ))
            .into());
        }

        let mut metadata = json!({
            "status": "success",
            "enabled": true,
            "command": command_line,
            "returncode": output.status.code().unwrap_or(0),
            "elapsed_sec": elapsed,
        });
        if !stdout.is_empty() {
            metadata["stdout"] = Value::String(stdout.clone());
            if let Ok(summary) = serde_json::from_str::<Value>(stdout.trim()) {
                if summary.is_object() {
                    metadata["summary"] = summary;
                }
            }
        }
        if !stderr.is_empty() {
            metadata["stderr"] = Value::String(stderr);
        }
        if let Some(rules) = &self.options.rules_path {
            metadata["rules_path"] = Value::String(rules.display().to_string());
        }
        context.publish("polisher_metadata", &metadata)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use deckgen_core::spec::JobSpec;

    fn context(dir: &std::path::Path) -> PipelineContext {
        let spec: JobSpec = serde_json::from_value(serde_json::json!({
            "meta": {"schema_version": "1.1", "title": "T"},
            "auth": {"created_by": "tester"},
            "slides": [{"id": "s1", "layout": "Title Slide"}]
        }))
        .unwrap();
        PipelineContext::new(spec, dir)
    }

    #[tokio::test]
    async fn disabled_polisher_records_metadata_and_returns() {
        let dir = tempfile::tempdir().unwrap();
        let mut context = context(dir.path());
        PolisherStep::new(PolisherOptions::default())
            .run(&mut context)
            .await
            .unwrap();
        let metadata = context.require("polisher_metadata").unwrap();
        assert_eq!(metadata["status"], "disabled");
        assert_eq!(metadata["enabled"], false);
    }

    #[tokio::test]
    async fn missing_executable_is_a_polisher_error() {
        let dir = tempfile::tempdir().unwrap();
        let pptx = dir.path().join("deck.pptx");
        std::fs::write(&pptx, b"stub").unwrap();

        let mut context = context(dir.path());
        context
            .publish("pptx_path", &pptx.display().to_string())
            .unwrap();

        let step = PolisherStep::new(PolisherOptions {
            enabled: true,
            executable: Some(dir.path().join("no-such-polisher")),
            ..PolisherOptions::default()
        });
        assert_matches!(
            step.run(&mut context).await,
            Err(PipelineError::Domain(CoreError::Polisher(_)))
        );
    }

    #[tokio::test]
    async fn enabled_polisher_requires_the_pptx_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut context = context(dir.path());
        let step = PolisherStep::new(PolisherOptions {
            enabled: true,
            ..PolisherOptions::default()
        });
        assert_matches!(
            step.run(&mut context).await,
            Err(PipelineError::Domain(CoreError::ArtifactMissing(_)))
        );
    }

    #[test]
    fn argument_template_substitutes_placeholders() {
        let step = PolisherStep::new(PolisherOptions {
            enabled: true,
            arguments: vec!["--fix".to_string(), "{pptx}".to_string()],
            rules_path: Some(PathBuf::from("/etc/deck-rules.json")),
            ..PolisherOptions::default()
        });
        let args = step.prepare_arguments("/tmp/deck.pptx");
        assert_eq!(
            args,
            vec!["--fix", "/tmp/deck.pptx", "--rules", "/etc/deck-rules.json"]
        );
    }

    #[test]
    fn default_arguments_pass_the_input_flag() {
        let step = PolisherStep::new(PolisherOptions::default());
        let args = step.prepare_arguments("/tmp/deck.pptx");
        assert_eq!(args, vec!["--input", "/tmp/deck.pptx"]);
    }
}
