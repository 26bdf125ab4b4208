//! Review payload synthesis.
//!
//! Converts analyzer output into the versioned payload the review UI
//! consumes: per-slide grades, issue codes, and auto-fix proposals
//! expressed as JSON-Patch over the job spec. Fix types with no patch
//! representation are reported under `notes.unsupported_fix_types`.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analyzer::{AnalysisDocument, AnalyzerFix, Severity};
use crate::content::Grade;
use crate::patch::{AutoFixProposal, JsonPatchOperation};
use crate::spec::{JobSpec, Slide};

pub const REVIEW_SCHEMA_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewIssue {
    pub code: String,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewNotes {
    #[serde(default)]
    pub unsupported_fix_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideReview {
    pub slide_id: String,
    pub grade: Grade,
    #[serde(default)]
    pub issues: Vec<ReviewIssue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub autofix_proposals: Vec<AutoFixProposal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<ReviewNotes>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewPayload {
    pub schema_version: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub slides: Vec<SlideReview>,
}

fn grade_for(severity: Severity) -> Grade {
    match severity {
        Severity::Critical => Grade::C,
        Severity::Warning => Grade::B,
        Severity::Info => Grade::A,
    }
}

/// Map `(slide_id, bullet_id)` to `(group index, item index)`.
fn bullet_lookup(spec: &JobSpec) -> HashMap<(&str, &str), (usize, usize)> {
    let mut lookup = HashMap::new();
    for slide in &spec.slides {
        for (group_index, group) in slide.bullets.iter().enumerate() {
            for (item_index, bullet) in group.items.iter().enumerate() {
                lookup.insert(
                    (slide.id.as_str(), bullet.id.as_str()),
                    (group_index, item_index),
                );
            }
        }
    }
    lookup
}

fn normalize_hex(value: &str) -> String {
    if value.starts_with('#') {
        value.to_string()
    } else {
        format!("#{value}")
    }
}

fn convert_fix(
    fix: &AnalyzerFix,
    slide: &Slide,
    slide_index: usize,
    lookup: &HashMap<(&str, &str), (usize, usize)>,
) -> Option<AutoFixProposal> {
    let element_id = fix.target.element_id.as_deref()?;
    let (group_index, item_index) = *lookup.get(&(slide.id.as_str(), element_id))?;
    let bullet = slide.bullets.get(group_index)?.items.get(item_index)?;
    let base = format!("/slides/{slide_index}/bullets/{group_index}/items/{item_index}");

    let (operation, description) = match fix.fix_type.as_str() {
        "bullet_reindent" | "bullet_cap" => {
            let level = fix.payload.get("level")?.as_u64()?;
            (
                JsonPatchOperation::replace(format!("{base}/level"), Value::from(level)),
                format!("set bullet level to {level}"),
            )
        }
        "font_raise" => {
            bullet.font.as_ref()?;
            let size = fix
                .payload
                .get("size_pt")
                .or_else(|| fix.payload.get("size"))?
                .as_f64()?;
            (
                JsonPatchOperation::replace(format!("{base}/font/size_pt"), Value::from(size)),
                format!("raise font size to {size:.1}pt"),
            )
        }
        "color_adjust" => {
            bullet.font.as_ref()?;
            let color = fix
                .payload
                .get("color_hex")
                .or_else(|| fix.payload.get("color"))?
                .as_str()?;
            let color = normalize_hex(color);
            (
                JsonPatchOperation::replace(
                    format!("{base}/font/color_hex"),
                    Value::String(color.clone()),
                ),
                format!("change text color to {color}"),
            )
        }
        _ => return None,
    };

    Some(AutoFixProposal {
        patch_id: fix.id.clone(),
        description,
        patch: vec![operation],
    })
}

/// Build the review payload for one analysis run.
pub fn build_payload(analysis: &AnalysisDocument, spec: &JobSpec) -> ReviewPayload {
    let lookup = bullet_lookup(spec);
    let slide_indices: HashMap<&str, usize> = spec
        .slides
        .iter()
        .enumerate()
        .map(|(index, slide)| (slide.id.as_str(), index))
        .collect();

    struct SlideState {
        issues: Vec<ReviewIssue>,
        worst: Option<Grade>,
        proposals: Vec<AutoFixProposal>,
        unsupported: BTreeSet<String>,
    }
    let mut state: HashMap<&str, SlideState> = spec
        .slides
        .iter()
        .map(|slide| {
            (
                slide.id.as_str(),
                SlideState {
                    issues: Vec::new(),
                    worst: None,
                    proposals: Vec::new(),
                    unsupported: BTreeSet::new(),
                },
            )
        })
        .collect();

    for issue in &analysis.issues {
        let Some(entry) = state.get_mut(issue.target.slide_id.as_str()) else {
            continue;
        };
        entry.issues.push(ReviewIssue {
            code: issue.issue_type.clone(),
            message: issue.message.clone(),
            severity: issue.severity,
        });
        let grade = grade_for(issue.severity);
        entry.worst = Some(entry.worst.map_or(grade, |current| current.max(grade)));
    }

    let mut seen_fix_ids = BTreeSet::new();
    for fix in &analysis.fixes {
        if fix.id.is_empty() || !seen_fix_ids.insert(fix.id.clone()) {
            continue;
        }
        let slide_id = fix.target.slide_id.as_str();
        let Some(&slide_index) = slide_indices.get(slide_id) else {
            continue;
        };
        let slide = &spec.slides[slide_index];
        let Some(entry) = state.get_mut(slide_id) else {
            continue;
        };
        match convert_fix(fix, slide, slide_index, &lookup) {
            Some(proposal) => entry.proposals.push(proposal),
            None => {
                entry.unsupported.insert(fix.fix_type.clone());
            }
        }
    }

    let slides = spec
        .slides
        .iter()
        .map(|slide| {
            let entry = state.remove(slide.id.as_str()).unwrap_or(SlideState {
                issues: Vec::new(),
                worst: None,
                proposals: Vec::new(),
                unsupported: BTreeSet::new(),
            });
            SlideReview {
                slide_id: slide.id.clone(),
                grade: entry.worst.unwrap_or(Grade::A),
                issues: entry.issues,
                autofix_proposals: entry.proposals,
                notes: if entry.unsupported.is_empty() {
                    None
                } else {
                    Some(ReviewNotes {
                        unsupported_fix_types: entry.unsupported.into_iter().collect(),
                    })
                },
            }
        })
        .collect();

    ReviewPayload {
        schema_version: REVIEW_SCHEMA_VERSION.to_string(),
        generated_at: chrono::Utc::now(),
        slides,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{AnalyzerIssue, IssueTarget};
    use crate::patch::PatchOp;

    fn spec_with_small_font() -> JobSpec {
        serde_json::from_value(serde_json::json!({
            "meta": {"schema_version": "1.1", "title": "Review"},
            "auth": {"created_by": "tester"},
            "slides": [{
                "id": "slide-1",
                "layout": "Title and Content",
                "bullets": [{"items": [{
                    "id": "bullet-1",
                    "text": "small",
                    "level": 0,
                    "font": {"name": "Yu Gothic", "size_pt": 12.0, "color_hex": "#333333"}
                }]}]
            }]
        }))
        .unwrap()
    }

    fn target(element_id: Option<&str>) -> IssueTarget {
        IssueTarget {
            slide_id: "slide-1".to_string(),
            element_id: element_id.map(str::to_string),
            element_type: Some("bullet".to_string()),
        }
    }

    fn analysis_with_font_and_move() -> AnalysisDocument {
        let raise = AnalyzerFix {
            id: "fix-1".to_string(),
            issue_id: "issue-1".to_string(),
            fix_type: "font_raise".to_string(),
            target: target(Some("bullet-1")),
            payload: serde_json::json!({ "size_pt": 20.0 }),
        };
        AnalysisDocument {
            slides: 1,
            meta: Value::Null,
            issues: vec![AnalyzerIssue {
                id: "issue-1".to_string(),
                issue_type: "font_min".to_string(),
                severity: Severity::Warning,
                message: "font too small".to_string(),
                target: target(Some("bullet-1")),
                metrics: None,
                fix: raise.clone(),
            }],
            fixes: vec![
                raise,
                AnalyzerFix {
                    id: "fix-2".to_string(),
                    issue_id: "issue-1".to_string(),
                    fix_type: "move".to_string(),
                    target: target(Some("img-1")),
                    payload: serde_json::json!({ "left_in": 0.5 }),
                },
            ],
        }
    }

    #[test]
    fn synthesizes_font_raise_patch_and_notes_unsupported() {
        let spec = spec_with_small_font();
        let payload = build_payload(&analysis_with_font_and_move(), &spec);

        assert_eq!(payload.schema_version, "1.0.0");
        assert_eq!(payload.slides.len(), 1);
        let slide = &payload.slides[0];
        assert_eq!(slide.grade, Grade::B);

        assert_eq!(slide.autofix_proposals.len(), 1);
        let op = &slide.autofix_proposals[0].patch[0];
        assert_eq!(op.op, PatchOp::Replace);
        assert!(op.path.ends_with("/font/size_pt"));
        assert_eq!(op.value, Some(Value::from(20.0)));

        let notes = slide.notes.as_ref().unwrap();
        assert_eq!(notes.unsupported_fix_types, vec!["move".to_string()]);
    }

    #[test]
    fn worst_severity_wins_the_grade() {
        let spec = spec_with_small_font();
        let mut analysis = analysis_with_font_and_move();
        analysis.issues.push(AnalyzerIssue {
            id: "issue-2".to_string(),
            issue_type: "contrast_low".to_string(),
            severity: Severity::Critical,
            message: "unreadable".to_string(),
            target: target(Some("bullet-1")),
            metrics: None,
            fix: analysis.fixes[0].clone(),
        });
        let payload = build_payload(&analysis, &spec);
        assert_eq!(payload.slides[0].grade, Grade::C);
    }

    #[test]
    fn untouched_slide_defaults_to_grade_a() {
        let spec = spec_with_small_font();
        let analysis = AnalysisDocument {
            slides: 1,
            ..AnalysisDocument::default()
        };
        let payload = build_payload(&analysis, &spec);
        assert_eq!(payload.slides[0].grade, Grade::A);
        assert!(payload.slides[0].issues.is_empty());
    }

    #[test]
    fn duplicate_fix_ids_convert_once() {
        let spec = spec_with_small_font();
        let mut analysis = analysis_with_font_and_move();
        let duplicate = analysis.fixes[0].clone();
        analysis.fixes.push(duplicate);
        let payload = build_payload(&analysis, &spec);
        assert_eq!(payload.slides[0].autofix_proposals.len(), 1);
    }

    #[test]
    fn fixes_for_unknown_slides_are_ignored() {
        let spec = spec_with_small_font();
        let mut analysis = analysis_with_font_and_move();
        analysis.fixes[0].target.slide_id = "other".to_string();
        analysis.fixes.truncate(1);
        let payload = build_payload(&analysis, &spec);
        assert!(payload.slides[0].autofix_proposals.is_empty());
    }
}
