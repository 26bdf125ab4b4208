//! Audit of the composed rendering-ready document.
//!
//! Checks each slide's element map against what the spec promises:
//! titles, subtitles, notes, and body content that the writer would
//! need. Produces the `rendering_log` consumed by monitoring.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use deckgen_core::ready::{ReadySlide, RenderingReadyDocument};
use deckgen_core::spec::Slide;

use crate::context::PipelineContext;
use crate::step::PipelineStep;
use crate::PipelineError;

pub struct RenderAuditStep {
    output_filename: String,
}

impl Default for RenderAuditStep {
    fn default() -> Self {
        Self {
            output_filename: "rendering_log.json".to_string(),
        }
    }
}

impl RenderAuditStep {
    pub fn new() -> Self {
        Self::default()
    }
}

fn element_has_content(value: &Value) -> bool {
    match value {
        Value::String(text) => !text.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(obj) => !obj.is_empty(),
        Value::Null => false,
        _ => true,
    }
}

fn expects_body(spec_slide: &Slide) -> bool {
    spec_slide
        .bullets
        .iter()
        .any(|group| group.anchor.is_none() && !group.items.is_empty())
}

fn inspect_slide(ready: &ReadySlide, spec_slide: &Slide) -> (Value, Vec<Value>, usize) {
    let present = |anchor: &str| {
        ready
            .elements
            .get(anchor)
            .map(element_has_content)
            .unwrap_or(false)
    };
    let detected = json!({
        "title": present("title"),
        "subtitle": present("subtitle"),
        "body": present("body"),
        "notes": present("notes"),
    });

    let mut warnings = Vec::new();
    if spec_slide.title.is_some() && !present("title") {
        warnings.push(json!({"code": "missing_title", "message": "title element is empty"}));
    }
    if spec_slide.subtitle.is_some() && !present("subtitle") {
        warnings.push(json!({"code": "missing_subtitle", "message": "subtitle element is empty"}));
    }
    if expects_body(spec_slide) && !present("body") {
        warnings.push(json!({"code": "missing_body", "message": "body element carries no content"}));
    }
    if spec_slide.notes.is_some() && !present("notes") {
        warnings.push(json!({"code": "missing_notes", "message": "notes element is empty"}));
    }

    let mut empty_count = 0usize;
    for (anchor, value) in &ready.elements {
        if element_has_content(value) {
            continue;
        }
        empty_count += 1;
        warnings.push(json!({
            "code": "empty_placeholder",
            "message": format!("element '{anchor}' is empty"),
        }));
    }

    (detected, warnings, empty_count)
}

#[async_trait]
impl PipelineStep for RenderAuditStep {
    fn name(&self) -> &'static str {
        "rendering_audit"
    }

    async fn run(&self, context: &mut PipelineContext) -> Result<(), PipelineError> {
        let Some(document) = context.get_as::<RenderingReadyDocument>("rendering_ready") else {
            warn!("rendering audit skipped: rendering_ready artifact is missing");
            return Ok(());
        };
        let spec = context.spec();

        let mut slides_payload = Vec::new();
        let mut warnings_total = 0usize;
        let mut empty_placeholders = 0usize;

        for (index, ready) in document.slides.iter().enumerate() {
            let spec_slide = spec.slides.get(index);
            let (detected, warnings, empty_count) = match spec_slide {
                Some(spec_slide) => inspect_slide(ready, spec_slide),
                None => (
                    json!({"title": false, "subtitle": false, "body": false, "notes": false}),
                    Vec::new(),
                    0,
                ),
            };
            warnings_total += warnings.len();
            empty_placeholders += empty_count;
            slides_payload.push(json!({
                "page_no": index as u32 + 1,
                "layout_id": &ready.layout_id,
                "detected": detected,
                "warnings": warnings,
            }));
        }

        // Spec slides with no composed counterpart.
        for (offset, spec_slide) in spec.slides.iter().enumerate().skip(document.slides.len()) {
            warnings_total += 1;
            slides_payload.push(json!({
                "page_no": offset as u32 + 1,
                "layout_id": &spec_slide.layout,
                "detected": {"title": false, "subtitle": false, "body": false, "notes": false},
                "warnings": [{
                    "code": "missing_slide",
                    "message": format!("spec slide '{}' has no composed slide", spec_slide.id),
                }],
            }));
        }

        let mut meta = json!({
            "generated_at": chrono::Utc::now(),
            "template_version": &document.meta.template_version,
            "warnings_total": warnings_total,
            "empty_placeholders": empty_placeholders,
        });
        if document.slides.len() != spec.slides.len() {
            meta["slide_count_actual"] = json!(document.slides.len());
            meta["slide_count_expected"] = json!(spec.slides.len());
        }

        let rendering_log = json!({"meta": meta, "slides": slides_payload});

        std::fs::create_dir_all(context.workdir())?;
        let output_path = context.workdir().join(&self.output_filename);
        std::fs::write(&output_path, serde_json::to_vec_pretty(&rendering_log)?)?;

        info!(
            warnings_total,
            empty_placeholders,
            path = %output_path.display(),
            "rendering audit completed"
        );
        context.publish("rendering_log", &rendering_log)?;
        context.publish("rendering_log_path", &output_path.display().to_string())?;
        context.publish(
            "rendering_summary",
            &json!({
                "warnings_total": warnings_total,
                "empty_placeholders": empty_placeholders,
            }),
        )?;
        Ok(())
    }
}
