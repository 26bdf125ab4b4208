//! Slide-ID alignment between brief cards and spec slides.
//!
//! Generated content carries brief card ids; the spec carries slide
//! ids. The aligner asks a match client for the best spec slide per
//! card and renames content slides where confidence clears the
//! threshold. Each spec slide can be claimed at most once; a later,
//! more confident match steals the claim and demotes the earlier one.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use deckgen_ai::matcher::{
    heuristic_score, CardProfile, SlideMatchCandidate, SlideMatchClient, SlideMatchRequest,
};
use deckgen_core::brief::{BriefCard, BriefDocument};
use deckgen_core::content::ContentApprovalDocument;
use deckgen_core::spec::JobSpec;

use crate::context::PipelineContext;
use crate::step::PipelineStep;
use crate::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentStatus {
    Applied,
    Pending,
    Fallback,
    Skipped,
}

/// Per-card outcome of the alignment pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentRecord {
    pub card_id: String,
    pub recommended_slide_id: Option<String>,
    pub confidence: f64,
    pub reason: Option<String>,
    pub status: AlignmentStatus,
    #[serde(default)]
    pub candidates: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SlideIdAlignerOptions {
    pub confidence_threshold: f64,
    pub max_candidates: usize,
}

impl Default for SlideIdAlignerOptions {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.6,
            max_candidates: 12,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlignmentResult {
    pub document: ContentApprovalDocument,
    pub records: Vec<AlignmentRecord>,
    pub meta: Value,
}

pub struct SlideIdAligner {
    options: SlideIdAlignerOptions,
    client: Arc<dyn SlideMatchClient>,
}

fn append_reason(reason: &mut Option<String>, suffix: &str) {
    let base = reason.take().unwrap_or_default();
    *reason = Some(format!("{base} | {suffix}"));
}

fn card_summary(card: &BriefCard) -> String {
    let mut lines: Vec<&str> = Vec::new();
    if !card.message.is_empty() {
        lines.push(&card.message);
    }
    lines.extend(card.narrative.iter().take(3).map(String::as_str));
    lines.extend(
        card.supporting_points
            .iter()
            .take(3)
            .map(|point| point.statement.as_str()),
    );
    let joined: Vec<&str> = lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect();
    if joined.is_empty() {
        card.message.clone()
    } else {
        joined.join("\n")
    }
}

impl SlideIdAligner {
    pub fn new(options: SlideIdAlignerOptions, client: Arc<dyn SlideMatchClient>) -> Self {
        Self { options, client }
    }

    /// Ranked candidate slides for one card, capped at `max_candidates`.
    fn select_candidates(&self, card: &CardProfile, spec: &JobSpec) -> Vec<SlideMatchCandidate> {
        let mut scored: Vec<(f64, SlideMatchCandidate)> = spec
            .slides
            .iter()
            .map(|slide| {
                let candidate = SlideMatchCandidate::from(slide);
                (heuristic_score(card, &candidate), candidate)
            })
            .collect();
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.slide_id.cmp(&b.1.slide_id))
        });
        scored
            .into_iter()
            .take(self.options.max_candidates)
            .map(|(_, candidate)| candidate)
            .collect()
    }

    pub fn align(
        &self,
        spec: &JobSpec,
        brief: Option<&BriefDocument>,
        content: &ContentApprovalDocument,
    ) -> AlignmentResult {
        let cards: HashMap<&str, &BriefCard> = match brief {
            Some(brief) if !brief.cards.is_empty() => brief
                .cards
                .iter()
                .map(|card| (card.card_id.as_str(), card))
                .collect(),
            _ => {
                info!("alignment skipped: no brief document");
                return AlignmentResult {
                    document: content.clone(),
                    records: Vec::new(),
                    meta: json!({"status": "skipped", "reason": "brief_document_absent"}),
                };
            }
        };
        if spec.slides.is_empty() {
            warn!("alignment skipped: spec has no slides");
            return AlignmentResult {
                document: content.clone(),
                records: Vec::new(),
                meta: json!({"status": "skipped", "reason": "jobspec_empty"}),
            };
        }

        // slide_id -> index of the record currently holding the claim
        let mut assignments: HashMap<String, usize> = HashMap::new();
        let mut records: Vec<AlignmentRecord> = Vec::new();

        for slide in &content.slides {
            let Some(card) = cards.get(slide.id.as_str()) else {
                records.push(AlignmentRecord {
                    card_id: slide.id.clone(),
                    recommended_slide_id: None,
                    confidence: 0.0,
                    reason: Some("card_not_found".to_string()),
                    status: AlignmentStatus::Pending,
                    candidates: Vec::new(),
                });
                continue;
            };

            let profile = CardProfile::from(*card);
            let candidates = self.select_candidates(&profile, spec);
            let candidate_ids: Vec<String> = candidates
                .iter()
                .map(|candidate| candidate.slide_id.clone())
                .collect();
            let response = self.client.match_slide(&SlideMatchRequest {
                card: profile,
                summary: card_summary(card),
                candidates,
            });

            let mut record = AlignmentRecord {
                card_id: card.card_id.clone(),
                recommended_slide_id: response
                    .slide_id
                    .filter(|id| candidate_ids.contains(id)),
                confidence: response.confidence,
                reason: response.reason,
                status: AlignmentStatus::Pending,
                candidates: candidate_ids,
            };

            if let Some(slide_id) = record.recommended_slide_id.clone() {
                if response.confidence >= self.options.confidence_threshold {
                    match assignments.get(&slide_id).copied() {
                        None => {
                            record.status = AlignmentStatus::Applied;
                            assignments.insert(slide_id, records.len());
                        }
                        Some(previous_index) => {
                            if response.confidence > records[previous_index].confidence {
                                let previous = &mut records[previous_index];
                                previous.recommended_slide_id = None;
                                previous.status = AlignmentStatus::Pending;
                                append_reason(&mut previous.reason, "reassigned");
                                record.status = AlignmentStatus::Applied;
                                assignments.insert(slide_id, records.len());
                            } else {
                                append_reason(&mut record.reason, "lower_than_existing");
                                record.recommended_slide_id = None;
                            }
                        }
                    }
                }
            }
            records.push(record);
        }

        // Second pass: unassigned cards may claim a leftover candidate.
        let mut fallback_applied = 0usize;
        for index in 0..records.len() {
            if records[index].status == AlignmentStatus::Applied
                && records[index].recommended_slide_id.is_some()
            {
                continue;
            }
            let claim = records[index]
                .candidates
                .iter()
                .find(|candidate| !assignments.contains_key(candidate.as_str()))
                .cloned();
            if let Some(slide_id) = claim {
                let record = &mut records[index];
                record.recommended_slide_id = Some(slide_id.clone());
                record.status = AlignmentStatus::Fallback;
                append_reason(&mut record.reason, "fallback_candidate");
                assignments.insert(slide_id, index);
                fallback_applied += 1;
            }
        }

        let mut aligned = content.clone();
        let mut applied = 0usize;
        for slide in &mut aligned.slides {
            let record = records
                .iter()
                .find(|record| record.card_id == slide.id)
                .filter(|record| record.recommended_slide_id.is_some());
            if let Some(record) = record {
                slide.id = record.recommended_slide_id.clone().unwrap_or_default();
                if matches!(
                    record.status,
                    AlignmentStatus::Applied | AlignmentStatus::Fallback
                ) {
                    applied += 1;
                }
            }
        }

        // Spec slides with no content after alignment.
        let aligned_ids: std::collections::HashSet<&str> = aligned
            .slides
            .iter()
            .map(|slide| slide.id.as_str())
            .collect();
        let unassigned: Vec<&str> = spec
            .slides
            .iter()
            .map(|slide| slide.id.as_str())
            .filter(|id| !aligned_ids.contains(id))
            .collect();
        for slide_id in &unassigned {
            records.push(AlignmentRecord {
                card_id: slide_id.to_string(),
                recommended_slide_id: None,
                confidence: 0.0,
                reason: Some("jobspec_unassigned".to_string()),
                status: AlignmentStatus::Skipped,
                candidates: Vec::new(),
            });
        }

        let pending = records
            .iter()
            .filter(|record| record.status == AlignmentStatus::Pending)
            .count();
        let meta = json!({
            "status": "completed",
            "threshold": self.options.confidence_threshold,
            "cards_total": content.slides.len(),
            "applied": applied,
            "fallback": fallback_applied,
            "pending": pending,
            "jobspec_total": spec.slides.len(),
            "jobspec_unassigned": unassigned.len(),
        });
        info!(
            cards_total = content.slides.len(),
            applied,
            pending,
            threshold = self.options.confidence_threshold,
            "alignment completed"
        );
        AlignmentResult {
            document: aligned,
            records,
            meta,
        }
    }
}

/// Pipeline wrapper: aligns the generated content document against the
/// spec using the optional `brief_document` artifact.
pub struct SlideAlignmentStep {
    aligner: SlideIdAligner,
}

impl SlideAlignmentStep {
    pub fn new(aligner: SlideIdAligner) -> Self {
        Self { aligner }
    }
}

#[async_trait]
impl PipelineStep for SlideAlignmentStep {
    fn name(&self) -> &'static str {
        "slide_alignment"
    }

    async fn run(&self, context: &mut PipelineContext) -> Result<(), PipelineError> {
        let content: ContentApprovalDocument = context.require_as("content_document")?;
        let brief: Option<BriefDocument> = context.get_as("brief_document");
        let result = self.aligner.align(context.spec(), brief.as_ref(), &content);
        context.publish("content_document", &result.document)?;
        context.publish("alignment_records", &result.records)?;
        context.publish("alignment_meta", &result.meta)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckgen_ai::matcher::MockSlideMatchClient;
    use deckgen_core::content::ContentSlide;

    fn aligner() -> SlideIdAligner {
        SlideIdAligner::new(SlideIdAlignerOptions::default(), Arc::new(MockSlideMatchClient))
    }

    fn spec() -> JobSpec {
        serde_json::from_value(serde_json::json!({
            "meta": {"schema_version": "1.1", "title": "FY25 Plan"},
            "auth": {"created_by": "tester"},
            "slides": [
                {"id": "s1", "layout": "Title Slide", "title": "FY25 Plan"},
                {"id": "s2", "layout": "Title and Content", "title": "Market outlook",
                 "notes": "Growth is accelerating"},
                {"id": "s3", "layout": "Title and Content", "title": "Roadmap"}
            ]
        }))
        .unwrap()
    }

    fn brief(cards: serde_json::Value) -> BriefDocument {
        serde_json::from_value(serde_json::json!({"brief_id": "br-1", "cards": cards})).unwrap()
    }

    fn content(ids: &[&str]) -> ContentApprovalDocument {
        ContentApprovalDocument {
            slides: ids.iter().map(|id| ContentSlide::new(*id)).collect(),
        }
    }

    #[test]
    fn absent_brief_skips_alignment() {
        let document = content(&["c1"]);
        let result = aligner().align(&spec(), None, &document);
        assert_eq!(result.meta["status"], "skipped");
        assert_eq!(result.meta["reason"], "brief_document_absent");
        assert_eq!(result.document, document);
    }

    #[test]
    fn confident_match_renames_the_content_slide() {
        let brief = brief(serde_json::json!([{
            "card_id": "c1",
            "chapter": "Market",
            "message": "Growth is accelerating"
        }]));
        let result = aligner().align(&spec(), Some(&brief), &content(&["c1"]));
        // chapter hit + notes similarity clears the threshold
        assert_eq!(result.records[0].status, AlignmentStatus::Applied);
        assert_eq!(result.document.slides[0].id, "s2");
        assert_eq!(result.meta["applied"], 1);
    }

    #[test]
    fn low_confidence_falls_back_to_an_unclaimed_candidate() {
        let brief = brief(serde_json::json!([{
            "card_id": "c1",
            "chapter": "Finance",
            "message": "Totally unrelated text"
        }]));
        let result = aligner().align(&spec(), Some(&brief), &content(&["c1"]));
        let record = &result.records[0];
        assert_eq!(record.status, AlignmentStatus::Fallback);
        assert!(record.reason.as_deref().unwrap().contains("fallback_candidate"));
        assert!(record.recommended_slide_id.is_some());
        assert_eq!(result.meta["fallback"], 1);
    }

    #[test]
    fn unmatched_spec_slides_are_counted_as_unassigned() {
        let brief = brief(serde_json::json!([{
            "card_id": "c1",
            "chapter": "Market",
            "message": "Growth is accelerating"
        }]));
        let result = aligner().align(&spec(), Some(&brief), &content(&["c1"]));
        assert_eq!(result.meta["jobspec_total"], 3);
        assert_eq!(result.meta["jobspec_unassigned"], 2);
        let skipped = result
            .records
            .iter()
            .filter(|record| record.status == AlignmentStatus::Skipped)
            .count();
        assert_eq!(skipped, 2);
    }

    #[test]
    fn card_without_a_brief_entry_stays_pending() {
        let brief = brief(serde_json::json!([{
            "card_id": "c1",
            "chapter": "Market",
            "message": "Growth is accelerating"
        }]));
        let result = aligner().align(&spec(), Some(&brief), &content(&["c1", "orphan"]));
        let orphan = result
            .records
            .iter()
            .find(|record| record.card_id == "orphan")
            .unwrap();
        // the fallback pass may still hand it a leftover candidate
        assert!(matches!(
            orphan.status,
            AlignmentStatus::Pending | AlignmentStatus::Fallback
        ));
    }

    #[test]
    fn higher_confidence_steals_an_existing_claim() {
        // s2 is the only slide, so both cards target it; the second
        // card matches s2 by exact id and wins the claim.
        let narrow_spec: JobSpec = serde_json::from_value(serde_json::json!({
            "meta": {"schema_version": "1.1", "title": "FY25 Plan"},
            "auth": {"created_by": "tester"},
            "slides": [
                {"id": "s2", "layout": "Title and Content", "title": "Market outlook",
                 "notes": "Growth is accelerating"}
            ]
        }))
        .unwrap();
        let brief = brief(serde_json::json!([
            {"card_id": "c1", "chapter": "Market", "message": "Growth is accelerating"},
            {"card_id": "s2", "chapter": "Market", "message": "Growth is accelerating"}
        ]));
        let result = aligner().align(&narrow_spec, Some(&brief), &content(&["c1", "s2"]));
        let first = &result.records[0];
        let second = &result.records[1];
        assert_eq!(second.status, AlignmentStatus::Applied);
        assert!(first.reason.as_deref().unwrap().contains("reassigned"));
    }
}
