//! Job spec: the root authoring input.
//!
//! A [`JobSpec`] describes one deck: metadata, the requesting author,
//! and an ordered list of slides with typed child collections
//! (bullets, tables, charts, images, textboxes).

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Font settings attached to a bullet or textbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub name: String,
    pub size_pt: f64,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default = "FontSpec::default_color")]
    pub color_hex: String,
}

impl FontSpec {
    fn default_color() -> String {
        "#000000".to_string()
    }
}

/// One bullet item. `level` 0 is top-level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideBullet {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub level: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<FontSpec>,
}

/// Ordered group of bullets bound to an optional anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideBulletGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    pub items: Vec<SlideBullet>,
}

/// Image element. `source` is a URL, data URI, or file path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideImage {
    pub id: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_in: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_in: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width_in: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_in: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_fill: Option<String>,
    #[serde(default)]
    pub zebra: bool,
}

/// Table element; cell values may be strings or numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideTable {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<TableStyle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    #[serde(default)]
    pub values: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartOptions {
    #[serde(default)]
    pub data_labels: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis_format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideChart {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    #[serde(rename = "type")]
    pub chart_type: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub series: Vec<ChartSeries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<ChartOptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextboxPosition {
    pub left_in: f64,
    pub top_in: f64,
    pub width_in: f64,
    pub height_in: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideTextbox {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<TextboxPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<FontSpec>,
}

/// One slide of the deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    pub id: String,
    pub layout: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub bullets: Vec<SlideBulletGroup>,
    #[serde(default)]
    pub images: Vec<SlideImage>,
    #[serde(default)]
    pub tables: Vec<SlideTable>,
    #[serde(default)]
    pub charts: Vec<SlideChart>,
    #[serde(default)]
    pub textboxes: Vec<SlideTextbox>,
}

impl Slide {
    /// Iterate all bullet items across groups, in document order.
    pub fn iter_bullets(&self) -> impl Iterator<Item = &SlideBullet> {
        self.bullets.iter().flat_map(|group| group.items.iter())
    }
}

/// Deck metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMeta {
    pub schema_version: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default = "JobMeta::default_locale")]
    pub locale: String,
}

impl JobMeta {
    fn default_locale() -> String {
        "en-US".to_string()
    }
}

/// Requesting author attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobAuth {
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

/// Root authoring input: one deck job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub meta: JobMeta,
    pub auth: JobAuth,
    #[serde(default)]
    pub slides: Vec<Slide>,
}

impl JobSpec {
    /// Parse a spec from a JSON string.
    pub fn from_json(source: &str) -> Result<Self, CoreError> {
        let spec: JobSpec = serde_json::from_str(source)
            .map_err(|e| CoreError::SchemaValidation(format!("invalid job spec JSON: {e}")))?;
        spec.validate()?;
        Ok(spec)
    }

    /// Read and parse a spec file.
    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            CoreError::SchemaValidation(format!("cannot read spec file {}: {e}", path.display()))
        })?;
        Self::from_json(&source)
    }

    /// Structural invariants that must hold for any spec.
    ///
    /// `schema_version` and `created_by` must be non-empty, and slide
    /// ids must be unique within the spec.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.meta.schema_version.trim().is_empty() {
            return Err(CoreError::SchemaValidation(
                "meta.schema_version must not be empty".to_string(),
            ));
        }
        if self.auth.created_by.trim().is_empty() {
            return Err(CoreError::SchemaValidation(
                "auth.created_by must not be empty".to_string(),
            ));
        }
        let mut seen: HashSet<&str> = HashSet::new();
        for slide in &self.slides {
            if !seen.insert(slide.id.as_str()) {
                return Err(CoreError::SchemaValidation(format!(
                    "duplicate slide id '{}'",
                    slide.id
                )));
            }
        }
        Ok(())
    }

    /// Look up a slide by id.
    pub fn slide(&self, id: &str) -> Option<&Slide> {
        self.slides.iter().find(|slide| slide.id == id)
    }
}
