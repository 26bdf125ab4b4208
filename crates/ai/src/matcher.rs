//! Slide matching for brief/spec alignment.
//!
//! The aligner asks a match client to pick, for one brief card, the
//! best candidate slide. The mock client scores candidates with the
//! same heuristic the aligner uses for candidate selection, so the
//! whole alignment flow is deterministic offline.

use serde::{Deserialize, Serialize};

use deckgen_core::brief::BriefCard;
use deckgen_core::spec::Slide;

/// The card-side facts relevant to matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardProfile {
    pub card_id: String,
    pub chapter: String,
    pub message: String,
    #[serde(default)]
    pub story_phase: Option<String>,
    #[serde(default)]
    pub intent_tags: Vec<String>,
}

impl From<&BriefCard> for CardProfile {
    fn from(card: &BriefCard) -> Self {
        Self {
            card_id: card.card_id.clone(),
            chapter: card.chapter.clone(),
            message: card.message.clone(),
            story_phase: card.story.as_ref().map(|story| {
                serde_json::to_value(story.phase)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default()
            }),
            intent_tags: card.intent_tags.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideMatchCandidate {
    pub slide_id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub layout: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<&Slide> for SlideMatchCandidate {
    fn from(slide: &Slide) -> Self {
        Self {
            slide_id: slide.id.clone(),
            title: slide.title.clone(),
            layout: slide.layout.clone(),
            subtitle: slide.subtitle.clone(),
            notes: slide.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideMatchRequest {
    pub card: CardProfile,
    pub summary: String,
    pub candidates: Vec<SlideMatchCandidate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideMatchResponse {
    #[serde(default)]
    pub slide_id: Option<String>,
    pub confidence: f64,
    #[serde(default)]
    pub reason: Option<String>,
}

pub trait SlideMatchClient: Send + Sync {
    fn match_slide(&self, request: &SlideMatchRequest) -> SlideMatchResponse;
}

/// Character-bigram Dice similarity in [0, 1].
fn similarity(a: &str, b: &str) -> f64 {
    let bigrams = |text: &str| -> Vec<(char, char)> {
        let chars: Vec<char> = text.chars().collect();
        chars.windows(2).map(|pair| (pair[0], pair[1])).collect()
    };
    let left = bigrams(a);
    let right = bigrams(b);
    if left.is_empty() || right.is_empty() {
        return if a == b && !a.is_empty() { 1.0 } else { 0.0 };
    }
    let mut remaining = right.clone();
    let mut overlap = 0usize;
    for gram in &left {
        if let Some(position) = remaining.iter().position(|other| other == gram) {
            remaining.swap_remove(position);
            overlap += 1;
        }
    }
    (2.0 * overlap as f64) / (left.len() + right.len()) as f64
}

/// Score one candidate against a card: exact id match dominates, then
/// chapter/intent hits in the title, story phase in the layout, and a
/// text-similarity term over the notes (or title).
pub fn heuristic_score(card: &CardProfile, candidate: &SlideMatchCandidate) -> f64 {
    let mut score = 0.0;
    if candidate.slide_id == card.card_id {
        score += 5.0;
    }
    let title = candidate.title.as_deref().unwrap_or("").to_lowercase();
    let chapter = card.chapter.to_lowercase();
    if !chapter.is_empty() && title.contains(&chapter) {
        score += 3.0;
    }
    if let Some(phase) = &card.story_phase {
        if !phase.is_empty() && candidate.layout.to_lowercase().contains(&phase.to_lowercase()) {
            score += 1.5;
        }
    }
    for intent in &card.intent_tags {
        if title.contains(&intent.to_lowercase()) {
            score += 1.0;
        }
    }
    let message = card.message.to_lowercase();
    let reference = candidate
        .notes
        .as_deref()
        .map(str::to_lowercase)
        .unwrap_or(title);
    score + similarity(&message, &reference) * 2.0
}

/// Deterministic matcher: highest heuristic score wins; equal scores
/// break lexicographically on slide id.
pub struct MockSlideMatchClient;

impl SlideMatchClient for MockSlideMatchClient {
    fn match_slide(&self, request: &SlideMatchRequest) -> SlideMatchResponse {
        let mut best: Option<(f64, &SlideMatchCandidate)> = None;
        for candidate in &request.candidates {
            let score = heuristic_score(&request.card, candidate);
            best = match best {
                None => Some((score, candidate)),
                Some((best_score, best_candidate)) => {
                    let replaces = score > best_score
                        || (score == best_score && candidate.slide_id < best_candidate.slide_id);
                    if replaces {
                        Some((score, candidate))
                    } else {
                        Some((best_score, best_candidate))
                    }
                }
            };
        }
        match best {
            Some((score, candidate)) => SlideMatchResponse {
                slide_id: Some(candidate.slide_id.clone()),
                confidence: (score / 8.0).clamp(0.0, 1.0),
                reason: Some("heuristic_match".to_string()),
            },
            None => SlideMatchResponse {
                slide_id: None,
                confidence: 0.0,
                reason: Some("no_candidates".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(card_id: &str, chapter: &str, message: &str) -> CardProfile {
        CardProfile {
            card_id: card_id.to_string(),
            chapter: chapter.to_string(),
            message: message.to_string(),
            story_phase: None,
            intent_tags: vec![],
        }
    }

    fn candidate(slide_id: &str, title: Option<&str>) -> SlideMatchCandidate {
        SlideMatchCandidate {
            slide_id: slide_id.to_string(),
            title: title.map(str::to_string),
            layout: "Title and Content".to_string(),
            subtitle: None,
            notes: None,
        }
    }

    #[test]
    fn exact_id_match_dominates() {
        let profile = card("s2", "Market", "Market overview");
        let request = SlideMatchRequest {
            card: profile,
            summary: String::new(),
            candidates: vec![
                candidate("s1", Some("Intro")),
                candidate("s2", None),
                candidate("s3", Some("Plan")),
            ],
        };
        let response = MockSlideMatchClient.match_slide(&request);
        assert_eq!(response.slide_id.as_deref(), Some("s2"));
        assert!(response.confidence >= 0.6);
    }

    #[test]
    fn chapter_in_title_beats_unrelated_candidates() {
        let profile = card("card-1", "Market", "Growth is accelerating");
        let request = SlideMatchRequest {
            card: profile,
            summary: String::new(),
            candidates: vec![
                candidate("s1", Some("Closing notes")),
                candidate("s2", Some("Market overview")),
            ],
        };
        let response = MockSlideMatchClient.match_slide(&request);
        assert_eq!(response.slide_id.as_deref(), Some("s2"));
    }

    #[test]
    fn ties_break_lexicographically() {
        let profile = card("card-1", "", "");
        let request = SlideMatchRequest {
            card: profile,
            summary: String::new(),
            candidates: vec![candidate("s9", None), candidate("s2", None)],
        };
        let response = MockSlideMatchClient.match_slide(&request);
        assert_eq!(response.slide_id.as_deref(), Some("s2"));
    }

    #[test]
    fn empty_candidate_list_yields_no_match() {
        let request = SlideMatchRequest {
            card: card("card-1", "", ""),
            summary: String::new(),
            candidates: vec![],
        };
        let response = MockSlideMatchClient.match_slide(&request);
        assert!(response.slide_id.is_none());
        assert_eq!(response.confidence, 0.0);
    }

    #[test]
    fn similarity_is_one_for_identical_text() {
        assert!((similarity("market overview", "market overview") - 1.0).abs() < 1e-9);
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }
}
