//! Content approval documents.
//!
//! A [`ContentApprovalDocument`] carries one reviewable card per slide.
//! Reviewers move cards through draft -> approved (or returned); the
//! composition step refuses to run until every card is approved.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum characters in a card title.
pub const MAX_TITLE_CHARS: usize = 120;
/// Maximum body lines per card.
pub const MAX_BODY_LINES: usize = 6;
/// Maximum characters per body line.
pub const MAX_BODY_LINE_CHARS: usize = 40;

/// Review state of a content card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    Draft,
    Approved,
    Returned,
}

/// Coarse review grade attached by the analyzer adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
}

/// Renderable payload of one card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentElements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ContentElements {
    /// Check the title and body constraints, collecting every offender.
    pub fn violations(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(title) = &self.title {
            if title.chars().count() > MAX_TITLE_CHARS {
                out.push(format!(
                    "title exceeds {MAX_TITLE_CHARS} characters ({})",
                    title.chars().count()
                ));
            }
        }
        if self.body.len() > MAX_BODY_LINES {
            out.push(format!(
                "body has {} lines, maximum is {MAX_BODY_LINES}",
                self.body.len()
            ));
        }
        for (index, line) in self.body.iter().enumerate() {
            if line.chars().count() > MAX_BODY_LINE_CHARS {
                out.push(format!(
                    "body line {index} exceeds {MAX_BODY_LINE_CHARS} characters"
                ));
            }
        }
        out
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let violations = self.violations();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(CoreError::SchemaValidation(violations.join("; ")))
        }
    }
}

/// Clamp generated body text to the card constraints.
///
/// Returns the normalized lines plus warning tokens for anything that
/// was cut: `body_lines_truncated` when lines past the cap are dropped,
/// `body_line_length_truncated` when a line is shortened.
pub fn normalize_body(lines: &[String]) -> (Vec<String>, Vec<String>) {
    let mut warnings = Vec::new();
    if lines.len() > MAX_BODY_LINES {
        warnings.push("body_lines_truncated".to_string());
    }
    let mut out = Vec::with_capacity(lines.len().min(MAX_BODY_LINES));
    for line in lines.iter().take(MAX_BODY_LINES) {
        if line.chars().count() > MAX_BODY_LINE_CHARS {
            if !warnings.iter().any(|w| w == "body_line_length_truncated") {
                warnings.push("body_line_length_truncated".to_string());
            }
            out.push(line.chars().take(MAX_BODY_LINE_CHARS).collect());
        } else {
            out.push(line.clone());
        }
    }
    (out, warnings)
}

/// Truncate a generated title to the card limit.
pub fn normalize_title(title: &str) -> String {
    title.chars().take(MAX_TITLE_CHARS).collect()
}

/// One reviewable content card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSlide {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,
    #[serde(default)]
    pub elements: ContentElements,
    #[serde(default = "default_status")]
    pub status: CardStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_review: Option<Grade>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applied_autofix: Vec<String>,
}

fn default_status() -> CardStatus {
    CardStatus::Draft
}

impl ContentSlide {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            intent: None,
            type_hint: None,
            elements: ContentElements::default(),
            status: CardStatus::Draft,
            ai_review: None,
            applied_autofix: Vec::new(),
        }
    }
}

/// Document of all content cards for one deck.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentApprovalDocument {
    #[serde(default)]
    pub slides: Vec<ContentSlide>,
}

impl ContentApprovalDocument {
    /// Fail with the ids of every card that is not approved.
    pub fn ensure_all_approved(&self) -> Result<(), CoreError> {
        let unapproved: Vec<String> = self
            .slides
            .iter()
            .filter(|slide| slide.status != CardStatus::Approved)
            .map(|slide| slide.id.clone())
            .collect();
        if unapproved.is_empty() {
            Ok(())
        } else {
            Err(CoreError::MissingApproval(unapproved))
        }
    }

    pub fn slide(&self, id: &str) -> Option<&ContentSlide> {
        self.slides.iter().find(|slide| slide.id == id)
    }
}

/// Audit action recorded against a content card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Create,
    Update,
    Approve,
    Return,
}

/// One append-only audit record for a content card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentReviewLogEntry {
    pub slide_id: String,
    pub action: ReviewAction,
    pub actor: String,
    /// ISO 8601 with timezone.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applied_autofix: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_grade: Option<Grade>,
}
