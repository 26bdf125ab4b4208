//! Template boundary commands.
//!
//! The PPTX binary itself is parsed by an external extractor; these
//! commands work on its JSON dump (the "template spec") and on the raw
//! template file for hashing. `tpl-release` emits handover metadata,
//! `tpl-extract` normalizes a dump, `layout-validate` runs the
//! structural checks and writes `layouts.jsonl` plus a report.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use deckgen_core::hashing::sha256_hex;
use deckgen_core::CoreError;

/* --------------------------------------------------------------------------
Template spec (extractor dump)
-------------------------------------------------------------------------- */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateAnchor {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub anchor_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateLayout {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub anchors: Vec<TemplateAnchor>,
    #[serde(default)]
    pub usage_tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub layouts: Vec<TemplateLayout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branding: Option<serde_json::Value>,
}

impl TemplateSpec {
    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            CoreError::SchemaValidation(format!(
                "cannot read template spec {}: {e}",
                path.display()
            ))
        })?;
        serde_json::from_str(&source)
            .map_err(|e| CoreError::SchemaValidation(format!("invalid template spec JSON: {e}")))
    }
}

/* --------------------------------------------------------------------------
tpl-release
-------------------------------------------------------------------------- */

#[derive(Debug, Parser)]
pub struct TplReleaseArgs {
    /// Template file to release (hashed as-is).
    #[arg(long, short = 't')]
    pub template: PathBuf,

    /// Brand name.
    #[arg(long)]
    pub brand: String,

    /// Template version.
    #[arg(long)]
    pub version: String,

    /// Template identifier (defaults to `<brand>_<version>`).
    #[arg(long)]
    pub template_id: Option<String>,

    /// Directory for release artifacts.
    #[arg(long, short = 'o', default_value = ".deckgen/release")]
    pub output: PathBuf,

    /// Release author recorded in the metadata.
    #[arg(long)]
    pub generated_by: Option<String>,

    /// Reviewer recorded in the metadata.
    #[arg(long)]
    pub reviewed_by: Option<String>,
}

pub fn tpl_release(args: &TplReleaseArgs) -> Result<()> {
    let bytes = std::fs::read(&args.template).map_err(|e| {
        CoreError::SchemaValidation(format!(
            "cannot read template {}: {e}",
            args.template.display()
        ))
    })?;
    let template_id = args
        .template_id
        .clone()
        .unwrap_or_else(|| format!("{}_{}", args.brand, args.version));

    let release = json!({
        "template_id": template_id,
        "brand": args.brand,
        "version": args.version,
        "template_path": args.template.display().to_string(),
        "sha256": format!("sha256:{}", sha256_hex(&bytes)),
        "generated_at": chrono::Utc::now(),
        "generated_by": args.generated_by,
        "reviewed_by": args.reviewed_by,
    });

    std::fs::create_dir_all(&args.output)?;
    let release_path = args.output.join("template_release.json");
    std::fs::write(&release_path, serde_json::to_vec_pretty(&release)?)?;
    info!(path = %release_path.display(), "template release written");
    println!("{}", release_path.display());
    Ok(())
}

/* --------------------------------------------------------------------------
tpl-extract
-------------------------------------------------------------------------- */

#[derive(Debug, Parser)]
pub struct TplExtractArgs {
    /// Extractor dump (template spec JSON).
    #[arg(long, short = 't')]
    pub template: PathBuf,

    /// Directory for the normalized artifacts.
    #[arg(long, short = 'o', default_value = ".deckgen/template")]
    pub output: PathBuf,
}

pub fn tpl_extract(args: &TplExtractArgs) -> Result<()> {
    let spec = TemplateSpec::from_file(&args.template)?;

    std::fs::create_dir_all(&args.output)?;
    let spec_path = args.output.join("template_spec.json");
    std::fs::write(&spec_path, serde_json::to_vec_pretty(&spec)?)?;
    println!("{}", spec_path.display());

    if let Some(branding) = &spec.branding {
        let branding_path = args.output.join("branding.json");
        std::fs::write(&branding_path, serde_json::to_vec_pretty(branding)?)?;
        println!("{}", branding_path.display());
    }

    info!(
        layouts = spec.layouts.len(),
        path = %spec_path.display(),
        "template spec extracted"
    );
    Ok(())
}

/* --------------------------------------------------------------------------
layout-validate
-------------------------------------------------------------------------- */

#[derive(Debug, Parser)]
pub struct LayoutValidateArgs {
    /// Template spec JSON to validate.
    #[arg(long, short = 't')]
    pub template: PathBuf,

    /// Directory for `layouts.jsonl` and the validation report.
    #[arg(long, short = 'o', default_value = ".deckgen/layouts")]
    pub output: PathBuf,
}

/// Structural findings over a template spec. Errors fail the command;
/// warnings only land in the report.
fn check_layouts(spec: &TemplateSpec) -> (Vec<String>, Vec<String>) {
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    if spec.layouts.is_empty() {
        errors.push("template spec declares no layouts".to_string());
    }

    let mut seen = std::collections::HashSet::new();
    for layout in &spec.layouts {
        if !seen.insert(layout.id.as_str()) {
            errors.push(format!("duplicate layout id '{}'", layout.id));
        }
        if layout.anchors.is_empty() {
            warnings.push(format!("layout '{}' declares no anchors", layout.id));
            continue;
        }
        let mut anchor_names = std::collections::HashSet::new();
        for anchor in &layout.anchors {
            if !anchor_names.insert(anchor.name.as_str()) {
                errors.push(format!(
                    "layout '{}' has duplicate anchor '{}'",
                    layout.id, anchor.name
                ));
            }
        }
        if !anchor_names.contains("title") {
            warnings.push(format!("layout '{}' has no title anchor", layout.id));
        }
    }

    (warnings, errors)
}

pub fn layout_validate(args: &LayoutValidateArgs) -> Result<()> {
    let spec = TemplateSpec::from_file(&args.template)?;
    let (warnings, errors) = check_layouts(&spec);

    std::fs::create_dir_all(&args.output)?;

    let layouts_path = args.output.join("layouts.jsonl");
    let mut lines = String::new();
    for layout in &spec.layouts {
        lines.push_str(&serde_json::to_string(layout)?);
        lines.push('\n');
    }
    std::fs::write(&layouts_path, lines)?;

    let report = json!({
        "generated_at": chrono::Utc::now(),
        "template_id": spec.template_id,
        "layouts": spec.layouts.len(),
        "warnings": warnings,
        "errors": errors,
        "warnings_count": warnings.len(),
        "errors_count": errors.len(),
    });
    let report_path = args.output.join("validation_report.json");
    std::fs::write(&report_path, serde_json::to_vec_pretty(&report)?)?;

    info!(
        warnings = warnings.len(),
        errors = errors.len(),
        path = %report_path.display(),
        "layout validation completed"
    );
    println!("{}", layouts_path.display());
    println!("{}", report_path.display());

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::SpecValidation(errors).into())
    }
}
