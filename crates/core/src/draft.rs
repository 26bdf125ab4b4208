//! Draft boards: layout proposals awaiting review.
//!
//! A board groups slide cards into named sections. Approving a section
//! locks every card in it; locked cards reject structural edits.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftSlideStatus {
    Proposed,
    Approved,
    Returned,
}

/// One scored layout option for a slide card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutCandidate {
    pub layout_id: String,
    pub score: f64,
}

/// One slide card on a draft board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSlideCard {
    /// Id of the spec/content slide this card proposes a layout for.
    pub ref_id: String,
    /// 1-based position within the section.
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_hint: Option<String>,
    #[serde(default)]
    pub layout_candidates: Vec<LayoutCandidate>,
    #[serde(default = "DraftSlideCard::default_status")]
    pub status: DraftSlideStatus,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub appendix: bool,
}

impl DraftSlideCard {
    fn default_status() -> DraftSlideStatus {
        DraftSlideStatus::Proposed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSection {
    pub name: String,
    #[serde(default = "DraftSection::default_status")]
    pub status: String,
    #[serde(default)]
    pub slides: Vec<DraftSlideCard>,
}

impl DraftSection {
    fn default_status() -> String {
        "open".to_string()
    }

    /// Rewrite `order` densely from 1 in current position order.
    pub fn renumber(&mut self) {
        for (index, slide) in self.slides.iter_mut().enumerate() {
            slide.order = index as u32 + 1;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appendix_limit: Option<u32>,
}

/// Root draft board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftDocument {
    #[serde(default)]
    pub sections: Vec<DraftSection>,
    #[serde(default)]
    pub meta: DraftMeta,
}

impl DraftDocument {
    /// Find the section holding a slide, plus the slide's index in it.
    pub fn locate_slide(&self, ref_id: &str) -> Option<(usize, usize)> {
        for (section_index, section) in self.sections.iter().enumerate() {
            if let Some(slide_index) = section.slides.iter().position(|s| s.ref_id == ref_id) {
                return Some((section_index, slide_index));
            }
        }
        None
    }

    pub fn slide(&self, ref_id: &str) -> Option<&DraftSlideCard> {
        self.locate_slide(ref_id)
            .map(|(si, ki)| &self.sections[si].slides[ki])
    }

    pub fn section(&self, name: &str) -> Option<&DraftSection> {
        self.sections.iter().find(|section| section.name == name)
    }
}

/// Audit record for a draft board mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftLogEntry {
    /// Slide ref or section name the action targeted.
    pub target: String,
    pub action: String,
    pub actor: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
