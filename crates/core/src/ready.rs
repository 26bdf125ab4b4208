//! Rendering-ready documents.
//!
//! The final structured form handed to the PPTX writer: per-slide
//! anchor-keyed element maps plus meta. Conversions to and from
//! [`JobSpec`] preserve titles, layouts, bullet texts per anchor, table
//! headers and rows, image sources, and chart series values.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::CoreError;
use crate::spec::{
    ChartOptions, ChartSeries, FontSpec, JobAuth, JobMeta, JobSpec, Slide, SlideBullet,
    SlideBulletGroup, SlideChart, SlideImage, SlideTable, SlideTextbox, TableStyle,
    TextboxPosition,
};

/// Per-slide bookkeeping carried alongside the element map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadySlideMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default)]
    pub page_no: u32,
    /// Spec slide ids this rendered slide was built from.
    #[serde(default)]
    pub source: Vec<String>,
    #[serde(default)]
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadySlide {
    pub layout_id: String,
    /// Anchor name -> scalar, list, or structured table/image/chart.
    #[serde(default)]
    pub elements: Map<String, Value>,
    #[serde(default)]
    pub meta: ReadySlideMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadyMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_meta: Option<JobMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_auth: Option<JobAuth>,
}

/// The document consumed by the PPTX writer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderingReadyDocument {
    #[serde(default)]
    pub slides: Vec<ReadySlide>,
    #[serde(default)]
    pub meta: ReadyMeta,
}

fn anchor_or(anchor: &Option<String>, kind: &str, index: usize) -> String {
    match anchor {
        Some(name) => name.clone(),
        None if index == 0 => kind.to_string(),
        None => format!("{kind}_{}", index + 1),
    }
}

fn bullets_to_value(group: &SlideBulletGroup) -> Value {
    Value::Array(
        group
            .items
            .iter()
            .map(|item| {
                let mut obj = json!({
                    "id": item.id,
                    "text": item.text,
                    "level": item.level,
                });
                if let Some(font) = &item.font {
                    obj["font"] = serde_json::to_value(font).unwrap_or(Value::Null);
                }
                obj
            })
            .collect(),
    )
}

fn table_to_value(table: &SlideTable) -> Value {
    let mut obj = json!({
        "type": "table",
        "id": table.id,
        "columns": table.columns,
        "rows": table.rows,
    });
    if let Some(style) = &table.style {
        obj["style"] = serde_json::to_value(style).unwrap_or(Value::Null);
    }
    obj
}

fn image_to_value(image: &SlideImage) -> Value {
    json!({
        "type": "image",
        "id": image.id,
        "source": image.source,
        "left_in": image.left_in,
        "top_in": image.top_in,
        "width_in": image.width_in,
        "height_in": image.height_in,
    })
}

fn chart_to_value(chart: &SlideChart) -> Value {
    let mut obj = json!({
        "type": "chart",
        "id": chart.id,
        "chart_type": chart.chart_type,
        "categories": chart.categories,
        "series": chart.series,
    });
    if let Some(options) = &chart.options {
        obj["options"] = serde_json::to_value(options).unwrap_or(Value::Null);
    }
    obj
}

fn textbox_to_value(textbox: &SlideTextbox) -> Value {
    let mut obj = json!({
        "type": "textbox",
        "id": textbox.id,
        "text": textbox.text,
    });
    if let Some(position) = &textbox.position {
        obj["position"] = serde_json::to_value(position).unwrap_or(Value::Null);
    }
    if let Some(font) = &textbox.font {
        obj["font"] = serde_json::to_value(font).unwrap_or(Value::Null);
    }
    obj
}

/// Build the element map for one spec slide.
pub fn slide_to_elements(slide: &Slide) -> Map<String, Value> {
    let mut elements = Map::new();
    if let Some(title) = &slide.title {
        elements.insert("title".to_string(), Value::String(title.clone()));
    }
    if let Some(subtitle) = &slide.subtitle {
        elements.insert("subtitle".to_string(), Value::String(subtitle.clone()));
    }
    if let Some(notes) = &slide.notes {
        elements.insert("notes".to_string(), Value::String(notes.clone()));
    }
    for (index, group) in slide.bullets.iter().enumerate() {
        elements.insert(anchor_or(&group.anchor, "body", index), bullets_to_value(group));
    }
    for (index, table) in slide.tables.iter().enumerate() {
        elements.insert(anchor_or(&table.anchor, "table", index), table_to_value(table));
    }
    for (index, image) in slide.images.iter().enumerate() {
        elements.insert(anchor_or(&image.anchor, "image", index), image_to_value(image));
    }
    for (index, chart) in slide.charts.iter().enumerate() {
        elements.insert(anchor_or(&chart.anchor, "chart", index), chart_to_value(chart));
    }
    for (index, textbox) in slide.textboxes.iter().enumerate() {
        elements.insert(
            anchor_or(&textbox.anchor, "textbox", index),
            textbox_to_value(textbox),
        );
    }
    elements
}

/// Lower a job spec into a rendering-ready document.
pub fn jobspec_to_rendering_ready(spec: &JobSpec) -> RenderingReadyDocument {
    let slides = spec
        .slides
        .iter()
        .enumerate()
        .map(|(index, slide)| ReadySlide {
            layout_id: slide.layout.clone(),
            elements: slide_to_elements(slide),
            meta: ReadySlideMeta {
                section: None,
                page_no: index as u32 + 1,
                source: vec![slide.id.clone()],
                fallback: false,
            },
        })
        .collect();
    RenderingReadyDocument {
        slides,
        meta: ReadyMeta {
            template_version: None,
            content_hash: None,
            generated_at: Some(chrono::Utc::now()),
            job_meta: Some(spec.meta.clone()),
            job_auth: Some(spec.auth.clone()),
        },
    }
}

fn parse_font(value: &Value) -> Option<FontSpec> {
    value
        .get("font")
        .and_then(|f| serde_json::from_value(f.clone()).ok())
}

fn value_to_bullets(anchor: &str, items: &[Value]) -> SlideBulletGroup {
    SlideBulletGroup {
        anchor: restore_anchor(anchor, "body"),
        items: items
            .iter()
            .map(|item| SlideBullet {
                id: item["id"].as_str().unwrap_or_default().to_string(),
                text: item["text"].as_str().unwrap_or_default().to_string(),
                level: item["level"].as_u64().unwrap_or(0) as u8,
                font: parse_font(item),
            })
            .collect(),
    }
}

fn restore_anchor(anchor: &str, kind: &str) -> Option<String> {
    if anchor == kind || anchor.starts_with(&format!("{kind}_")) {
        None
    } else {
        Some(anchor.to_string())
    }
}

/// Lift a rendering-ready document back into a job spec.
///
/// Only fields the lowering writes are recoverable; everything else
/// takes defaults. Used by the renderer boundary and by tests of the
/// round-trip property.
pub fn rendering_ready_to_jobspec(doc: &RenderingReadyDocument) -> Result<JobSpec, CoreError> {
    let meta = doc.meta.job_meta.clone().ok_or_else(|| {
        CoreError::SchemaValidation("rendering-ready document lacks job_meta".to_string())
    })?;
    let auth = doc.meta.job_auth.clone().ok_or_else(|| {
        CoreError::SchemaValidation("rendering-ready document lacks job_auth".to_string())
    })?;

    let mut slides = Vec::with_capacity(doc.slides.len());
    for (index, ready) in doc.slides.iter().enumerate() {
        let id = ready
            .meta
            .source
            .first()
            .cloned()
            .unwrap_or_else(|| format!("slide-{}", index + 1));
        let mut slide = Slide {
            id,
            layout: ready.layout_id.clone(),
            title: None,
            subtitle: None,
            notes: None,
            bullets: vec![],
            images: vec![],
            tables: vec![],
            charts: vec![],
            textboxes: vec![],
        };
        for (anchor, value) in &ready.elements {
            match (anchor.as_str(), value) {
                ("title", Value::String(text)) => slide.title = Some(text.clone()),
                ("subtitle", Value::String(text)) => slide.subtitle = Some(text.clone()),
                ("notes", Value::String(text)) => slide.notes = Some(text.clone()),
                (_, Value::Array(items)) => slide.bullets.push(value_to_bullets(anchor, items)),
                (_, Value::Object(obj)) => match obj.get("type").and_then(Value::as_str) {
                    Some("table") => slide.tables.push(SlideTable {
                        id: obj["id"].as_str().unwrap_or_default().to_string(),
                        anchor: restore_anchor(anchor, "table"),
                        columns: serde_json::from_value(
                            obj.get("columns").cloned().unwrap_or(Value::Null),
                        )
                        .unwrap_or_default(),
                        rows: serde_json::from_value(
                            obj.get("rows").cloned().unwrap_or(Value::Null),
                        )
                        .unwrap_or_default(),
                        style: obj
                            .get("style")
                            .and_then(|s| serde_json::from_value::<TableStyle>(s.clone()).ok()),
                    }),
                    Some("image") => slide.images.push(SlideImage {
                        id: obj["id"].as_str().unwrap_or_default().to_string(),
                        source: obj["source"].as_str().unwrap_or_default().to_string(),
                        anchor: restore_anchor(anchor, "image"),
                        left_in: obj.get("left_in").and_then(Value::as_f64),
                        top_in: obj.get("top_in").and_then(Value::as_f64),
                        width_in: obj.get("width_in").and_then(Value::as_f64),
                        height_in: obj.get("height_in").and_then(Value::as_f64),
                    }),
                    Some("chart") => slide.charts.push(SlideChart {
                        id: obj["id"].as_str().unwrap_or_default().to_string(),
                        anchor: restore_anchor(anchor, "chart"),
                        chart_type: obj["chart_type"].as_str().unwrap_or_default().to_string(),
                        categories: serde_json::from_value(
                            obj.get("categories").cloned().unwrap_or(Value::Null),
                        )
                        .unwrap_or_default(),
                        series: serde_json::from_value::<Vec<ChartSeries>>(
                            obj.get("series").cloned().unwrap_or(Value::Null),
                        )
                        .unwrap_or_default(),
                        options: obj
                            .get("options")
                            .and_then(|o| serde_json::from_value::<ChartOptions>(o.clone()).ok()),
                    }),
                    Some("textbox") => slide.textboxes.push(SlideTextbox {
                        id: obj["id"].as_str().unwrap_or_default().to_string(),
                        text: obj["text"].as_str().unwrap_or_default().to_string(),
                        anchor: restore_anchor(anchor, "textbox"),
                        position: obj
                            .get("position")
                            .and_then(|p| serde_json::from_value::<TextboxPosition>(p.clone()).ok()),
                        font: parse_font(value),
                    }),
                    _ => {}
                },
                _ => {}
            }
        }
        slides.push(slide);
    }

    let spec = JobSpec { meta, auth, slides };
    spec.validate()?;
    Ok(spec)
}
