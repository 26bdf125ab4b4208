//! Composition: approved content + job spec -> rendering-ready document.
//!
//! Gate: every content card must be approved. The spec provides the
//! structural elements; approved card text overrides title, body, note,
//! and table data per slide. Also proposes a draft board mirroring the
//! composed slide order.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use deckgen_core::content::{ContentApprovalDocument, ContentSlide};
use deckgen_core::draft::{DraftDocument, DraftMeta, DraftSection, DraftSlideCard, DraftSlideStatus};
use deckgen_core::hashing;
use deckgen_core::ready::{jobspec_to_rendering_ready, ReadySlide, RenderingReadyDocument};

use crate::context::PipelineContext;
use crate::step::PipelineStep;
use crate::PipelineError;

pub struct ComposeStep {
    template_version: Option<String>,
    output_filename: String,
}

impl ComposeStep {
    pub fn new(template_version: Option<String>) -> Self {
        Self {
            template_version,
            output_filename: "generate_ready.json".to_string(),
        }
    }

    fn overlay_content(ready: &mut ReadySlide, card: &ContentSlide) {
        let slide_id = card.id.as_str();
        if let Some(title) = &card.elements.title {
            ready
                .elements
                .insert("title".to_string(), Value::String(title.clone()));
        }
        if !card.elements.body.is_empty() {
            let items: Vec<Value> = card
                .elements
                .body
                .iter()
                .enumerate()
                .map(|(index, text)| {
                    json!({
                        "id": format!("{slide_id}-b{}", index + 1),
                        "text": text,
                        "level": 0,
                    })
                })
                .collect();
            ready.elements.insert("body".to_string(), Value::Array(items));
        }
        if let Some(note) = &card.elements.note {
            ready
                .elements
                .insert("notes".to_string(), Value::String(note.clone()));
        }
        if let Some(table) = &card.elements.table_data {
            let mut value = table.clone();
            if let Some(obj) = value.as_object_mut() {
                obj.entry("type").or_insert(Value::String("table".to_string()));
                obj.entry("id").or_insert(Value::String(format!("{slide_id}-table")));
            }
            ready.elements.insert("table".to_string(), value);
        }
    }

    fn draft_proposal(document: &RenderingReadyDocument) -> DraftDocument {
        let slides = document
            .slides
            .iter()
            .enumerate()
            .map(|(index, slide)| DraftSlideCard {
                ref_id: slide
                    .meta
                    .source
                    .first()
                    .cloned()
                    .unwrap_or_else(|| format!("page-{}", index + 1)),
                order: index as u32 + 1,
                layout_hint: Some(slide.layout_id.clone()),
                layout_candidates: Vec::new(),
                status: DraftSlideStatus::Proposed,
                locked: false,
                appendix: false,
            })
            .collect();
        DraftDocument {
            sections: vec![DraftSection {
                name: "auto".to_string(),
                status: "open".to_string(),
                slides,
            }],
            meta: DraftMeta {
                target_length: Some(document.slides.len() as u32),
                structure_pattern: Some("auto".to_string()),
                appendix_limit: Some(0),
            },
        }
    }
}

#[async_trait]
impl PipelineStep for ComposeStep {
    fn name(&self) -> &'static str {
        "compose"
    }

    async fn run(&self, context: &mut PipelineContext) -> Result<(), PipelineError> {
        let content: ContentApprovalDocument = context.require_as("content_document")?;
        content.ensure_all_approved()?;

        let mut document = jobspec_to_rendering_ready(context.spec());
        for ready in &mut document.slides {
            let card = ready
                .meta
                .source
                .first()
                .and_then(|id| content.slide(id));
            if let Some(card) = card {
                Self::overlay_content(ready, card);
            }
        }
        document.meta.template_version = self.template_version.clone();
        document.meta.content_hash = Some(hashing::content_hash(&content)?);

        std::fs::create_dir_all(context.workdir())?;
        let output_path = context.workdir().join(&self.output_filename);
        std::fs::write(&output_path, serde_json::to_vec_pretty(&document)?)?;

        let proposal = Self::draft_proposal(&document);
        info!(
            slides = document.slides.len(),
            path = %output_path.display(),
            "rendering-ready document composed"
        );
        context.publish("rendering_ready", &document)?;
        context.publish("generate_ready_path", &output_path.display().to_string())?;
        context.publish("draft_document", &proposal)?;
        context.publish(
            "compose_meta",
            &json!({
                "slides": document.slides.len(),
                "content_hash": &document.meta.content_hash,
                "generated_at": &document.meta.generated_at,
            }),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use deckgen_core::content::{CardStatus, ContentElements};
    use deckgen_core::spec::JobSpec;
    use deckgen_core::CoreError;

    fn spec() -> JobSpec {
        serde_json::from_value(serde_json::json!({
            "meta": {"schema_version": "1.1", "title": "FY25 Plan"},
            "auth": {"created_by": "tester"},
            "slides": [
                {"id": "s1", "layout": "Title Slide", "title": "FY25 Plan"},
                {"id": "s2", "layout": "Title and Content", "title": "Market"}
            ]
        }))
        .unwrap()
    }

    fn approved_card(id: &str, title: &str, body: &[&str]) -> ContentSlide {
        ContentSlide {
            status: CardStatus::Approved,
            elements: ContentElements {
                title: Some(title.to_string()),
                body: body.iter().map(|s| s.to_string()).collect(),
                table_data: None,
                note: None,
            },
            ..ContentSlide::new(id)
        }
    }

    fn context(dir: &std::path::Path, content: &ContentApprovalDocument) -> PipelineContext {
        let mut context = PipelineContext::new(spec(), dir);
        context.publish("content_document", content).unwrap();
        context
    }

    #[tokio::test]
    async fn unapproved_cards_block_composition() {
        let dir = tempfile::tempdir().unwrap();
        let content = ContentApprovalDocument {
            slides: vec![ContentSlide::new("s1")],
        };
        let mut context = context(dir.path(), &content);
        let err = ComposeStep::new(None).run(&mut context).await.unwrap_err();
        assert_matches!(err, PipelineError::Domain(CoreError::MissingApproval(ids)) if ids == vec!["s1"]);
    }

    #[tokio::test]
    async fn approved_content_overrides_spec_elements() {
        let dir = tempfile::tempdir().unwrap();
        let content = ContentApprovalDocument {
            slides: vec![
                approved_card("s1", "A better cover", &[]),
                approved_card("s2", "Market outlook", &["Growth is up", "Risks are managed"]),
            ],
        };
        let mut context = context(dir.path(), &content);
        ComposeStep::new(Some("tpl-v3".to_string()))
            .run(&mut context)
            .await
            .unwrap();

        let document: RenderingReadyDocument = context.require_as("rendering_ready").unwrap();
        assert_eq!(document.meta.template_version.as_deref(), Some("tpl-v3"));
        assert_eq!(document.slides[0].elements["title"], "A better cover");
        let body = document.slides[1].elements["body"].as_array().unwrap();
        assert_eq!(body.len(), 2);
        assert_eq!(body[0]["text"], "Growth is up");
        assert!(dir.path().join("generate_ready.json").exists());
    }

    #[tokio::test]
    async fn a_draft_proposal_mirrors_the_composed_order() {
        let dir = tempfile::tempdir().unwrap();
        let content = ContentApprovalDocument {
            slides: vec![
                approved_card("s1", "Cover", &[]),
                approved_card("s2", "Market", &[]),
            ],
        };
        let mut context = context(dir.path(), &content);
        ComposeStep::new(None).run(&mut context).await.unwrap();

        let proposal: DraftDocument = context.require_as("draft_document").unwrap();
        assert_eq!(proposal.sections.len(), 1);
        let refs: Vec<&str> = proposal.sections[0]
            .slides
            .iter()
            .map(|card| card.ref_id.as_str())
            .collect();
        assert_eq!(refs, vec!["s1", "s2"]);
        assert_eq!(proposal.sections[0].slides[1].order, 2);
    }

    #[tokio::test]
    async fn missing_content_document_is_an_artifact_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut context = PipelineContext::new(spec(), dir.path());
        assert_matches!(
            ComposeStep::new(None).run(&mut context).await,
            Err(PipelineError::Domain(CoreError::ArtifactMissing(_)))
        );
    }
}
