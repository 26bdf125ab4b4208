//! Brief documents: the narrative input that precedes a deck.
//!
//! A brief is a set of message cards grouped by chapter; the slide-ID
//! aligner uses these cards to reconcile generated content with the
//! spec's slide ids.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    Url,
    SourceId,
    Note,
}

/// Supporting evidence for a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(rename = "type")]
    pub evidence_type: EvidenceType,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportingPoint {
    pub statement: String,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

/// Story-arc phase a card belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryPhase {
    Introduction,
    Problem,
    Solution,
    Impact,
    Next,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardStory {
    pub phase: StoryPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

/// One narrative card of a brief.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriefCard {
    pub card_id: String,
    pub chapter: String,
    pub message: String,
    #[serde(default)]
    pub narrative: Vec<String>,
    #[serde(default)]
    pub supporting_points: Vec<SupportingPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story: Option<CardStory>,
    #[serde(default)]
    pub intent_tags: Vec<String>,
    #[serde(default = "BriefCard::default_status")]
    pub status: String,
    #[serde(default)]
    pub autofix_applied: Vec<String>,
}

impl BriefCard {
    fn default_status() -> String {
        "draft".to_string()
    }
}

/// Root brief document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriefDocument {
    pub brief_id: String,
    #[serde(default)]
    pub cards: Vec<BriefCard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_context: Option<String>,
}

impl BriefDocument {
    pub fn from_json(source: &str) -> Result<Self, CoreError> {
        let doc: BriefDocument = serde_json::from_str(source)
            .map_err(|e| CoreError::SchemaValidation(format!("invalid brief JSON: {e}")))?;
        doc.validate()?;
        Ok(doc)
    }

    /// Card ids must be unique and statements non-blank.
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut seen = std::collections::HashSet::new();
        for card in &self.cards {
            if !seen.insert(card.card_id.as_str()) {
                return Err(CoreError::SchemaValidation(format!(
                    "duplicate brief card id '{}'",
                    card.card_id
                )));
            }
            for point in &card.supporting_points {
                if point.statement.trim().is_empty() {
                    return Err(CoreError::SchemaValidation(format!(
                        "brief card '{}' has a blank supporting statement",
                        card.card_id
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn card(&self, card_id: &str) -> Option<&BriefCard> {
        self.cards.iter().find(|card| card.card_id == card_id)
    }
}
