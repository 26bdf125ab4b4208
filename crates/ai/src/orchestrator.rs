//! Content generation orchestration.
//!
//! For each spec slide: resolve the policy's intent and prompt for the
//! slide's layout, render the prompt, call the LLM client, and shape
//! the response into a draft content card. Emits one log record per
//! slide plus a generation meta block with per-slide content hashes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use deckgen_core::content::{
    normalize_body, normalize_title, CardStatus, ContentApprovalDocument, ContentElements,
    ContentSlide,
};
use deckgen_core::hashing;
use deckgen_core::spec::{JobSpec, Slide};
use deckgen_core::CoreError;

use crate::client::LlmClient;
use crate::policy::{ContentAiPolicy, ContentAiPolicySet};
use crate::LlmError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationLogEntry {
    pub slide_id: String,
    pub layout: String,
    pub prompt: String,
    pub policy_id: String,
    pub model: String,
    pub intent: String,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub document: ContentApprovalDocument,
    pub meta: serde_json::Value,
    pub logs: Vec<GenerationLogEntry>,
}

pub struct ContentAiOrchestrator {
    policy_set: ContentAiPolicySet,
    client: Arc<dyn LlmClient>,
}

fn render_prompt(template: &str, spec: &JobSpec, slide: &Slide) -> String {
    template
        .replace("{spec_title}", &spec.meta.title)
        .replace("{spec_client}", spec.meta.client.as_deref().unwrap_or(""))
        .replace("{slide_id}", &slide.id)
        .replace("{slide_title}", slide.title.as_deref().unwrap_or(""))
        .replace("{slide_layout}", &slide.layout)
}

/// The shape a well-behaved model returns. Free-form responses fall
/// back to deterministic construction from the slide itself.
#[derive(Deserialize)]
struct StructuredResponse {
    title: Option<String>,
    #[serde(default)]
    body: Vec<String>,
    note: Option<String>,
}

struct ShapedContent {
    title: String,
    body: Vec<String>,
    note: Option<String>,
    warnings: Vec<String>,
}

fn shape_response(
    text: &str,
    spec: &JobSpec,
    slide: &Slide,
    prompt: &str,
    policy: &ContentAiPolicy,
) -> ShapedContent {
    if let Ok(parsed) = serde_json::from_str::<StructuredResponse>(text) {
        let title_source = parsed
            .title
            .or_else(|| slide.title.clone())
            .unwrap_or_else(|| format!("{} ({})", spec.meta.title, slide.id));
        let (body, warnings) = normalize_body(&parsed.body);
        return ShapedContent {
            title: normalize_title(&title_source),
            body,
            note: parsed.note,
            warnings,
        };
    }

    let title_source = slide
        .title
        .clone()
        .unwrap_or_else(|| format!("{} ({})", spec.meta.title, slide.id));
    let mut candidates: Vec<String> = slide
        .iter_bullets()
        .map(|bullet| bullet.text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();
    if candidates.is_empty() {
        candidates.push(prompt.to_string());
    }
    let (body, warnings) = normalize_body(&candidates);
    ShapedContent {
        title: normalize_title(&title_source),
        body,
        note: Some(format!("Generated with the {} policy.", policy.name)),
        warnings,
    }
}

impl ContentAiOrchestrator {
    pub fn new(policy_set: ContentAiPolicySet, client: Arc<dyn LlmClient>) -> Self {
        Self { policy_set, client }
    }

    /// Generate one draft card per spec slide.
    pub async fn generate_document(
        &self,
        spec: &JobSpec,
        policy_id: Option<&str>,
    ) -> Result<GenerationOutput, LlmError> {
        let policy = self.policy_set.get_policy(policy_id)?;

        let mut slides = Vec::with_capacity(spec.slides.len());
        let mut logs = Vec::with_capacity(spec.slides.len());

        for spec_slide in &spec.slides {
            let template = policy.resolve_prompt(&spec_slide.layout)?;
            let prompt = render_prompt(template, spec, spec_slide);
            let intent = policy.resolve_intent(&spec_slide.layout).to_string();

            info!(
                slide_id = %spec_slide.id,
                policy_id = %policy.id,
                intent = %intent,
                prompt = %prompt,
                "AI Request"
            );

            let completion = self.client.complete(&prompt, Some(&policy.model)).await?;
            let shaped = shape_response(&completion.text, spec, spec_slide, &prompt, policy);

            info!(
                slide_id = %spec_slide.id,
                model = %completion.model,
                intent = %intent,
                title = %shaped.title,
                warnings = ?shaped.warnings,
                "AI Response"
            );

            slides.push(ContentSlide {
                id: spec_slide.id.clone(),
                intent: Some(intent.clone()),
                type_hint: None,
                elements: ContentElements {
                    title: Some(shaped.title),
                    body: shaped.body,
                    table_data: None,
                    note: shaped.note,
                },
                status: CardStatus::Draft,
                ai_review: None,
                applied_autofix: Vec::new(),
            });
            logs.push(GenerationLogEntry {
                slide_id: spec_slide.id.clone(),
                layout: spec_slide.layout.clone(),
                prompt,
                policy_id: policy.id.clone(),
                model: completion.model,
                intent,
                warnings: shaped.warnings,
            });
        }

        let document = ContentApprovalDocument { slides };
        let meta = build_generation_meta(spec, policy, &document, &logs)?;
        Ok(GenerationOutput {
            document,
            meta,
            logs,
        })
    }
}

fn build_generation_meta(
    spec: &JobSpec,
    policy: &ContentAiPolicy,
    document: &ContentApprovalDocument,
    logs: &[GenerationLogEntry],
) -> Result<serde_json::Value, CoreError> {
    let spec_hash = hashing::content_hash(spec)?;
    let slides_meta: Vec<serde_json::Value> = document
        .slides
        .iter()
        .zip(logs.iter())
        .map(|(slide, log)| {
            Ok(json!({
                "slide_id": slide.id,
                "intent": slide.intent,
                "content_hash": hashing::content_hash(&slide.elements)?,
                "body_lines": slide.elements.body.len(),
                "model": log.model,
            }))
        })
        .collect::<Result<_, CoreError>>()?;

    Ok(json!({
        "generated_at": chrono::Utc::now(),
        "policy_id": policy.id,
        "policy_name": policy.name,
        "model": policy.model,
        "spec": {
            "title": spec.meta.title,
            "client": spec.meta.client,
            "hash": spec_hash,
        },
        "slides": slides_meta,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockLlmClient;
    use deckgen_core::content::{MAX_BODY_LINES, MAX_BODY_LINE_CHARS};

    fn spec_with_three_slides() -> JobSpec {
        serde_json::from_value(serde_json::json!({
            "meta": {"schema_version": "1.1", "title": "FY25 Growth Plan", "client": "Zeta"},
            "auth": {"created_by": "tester"},
            "slides": [
                {"id": "s1", "layout": "Title Slide", "title": "FY25 Growth Plan"},
                {
                    "id": "s2",
                    "layout": "Title and Content",
                    "title": "Market",
                    "bullets": [{"items": [
                        {"id": "b1", "text": "Segment A is growing twenty percent"},
                        {"id": "b2", "text": "Segment B is flat"}
                    ]}]
                },
                {"id": "s3", "layout": "Section Header", "title": "Plan"}
            ]
        }))
        .unwrap()
    }

    fn orchestrator() -> ContentAiOrchestrator {
        ContentAiOrchestrator::new(ContentAiPolicySet::builtin(), Arc::new(MockLlmClient))
    }

    #[tokio::test]
    async fn every_slide_yields_one_draft_card() {
        let spec = spec_with_three_slides();
        let output = orchestrator().generate_document(&spec, None).await.unwrap();

        assert_eq!(output.document.slides.len(), 3);
        for slide in &output.document.slides {
            assert_eq!(slide.status, CardStatus::Draft);
            assert!(slide.elements.body.len() <= MAX_BODY_LINES);
            assert!(slide
                .elements
                .body
                .iter()
                .all(|line| line.chars().count() <= MAX_BODY_LINE_CHARS));
        }
    }

    #[tokio::test]
    async fn first_log_prompt_carries_the_spec_title() {
        let spec = spec_with_three_slides();
        let output = orchestrator().generate_document(&spec, None).await.unwrap();
        assert_eq!(output.logs.len(), 3);
        assert!(output.logs[0].prompt.contains("FY25 Growth Plan"));
    }

    #[tokio::test]
    async fn bullet_texts_become_the_body() {
        let spec = spec_with_three_slides();
        let output = orchestrator().generate_document(&spec, None).await.unwrap();
        let market = output.document.slide("s2").unwrap();
        assert!(market.elements.body[0].contains("Segment A"));
    }

    #[tokio::test]
    async fn intents_follow_the_layout_policy() {
        let spec = spec_with_three_slides();
        let output = orchestrator().generate_document(&spec, None).await.unwrap();
        assert_eq!(output.document.slide("s1").unwrap().intent.as_deref(), Some("cover"));
        assert_eq!(
            output.document.slide("s2").unwrap().intent.as_deref(),
            Some("content")
        );
    }

    #[tokio::test]
    async fn meta_carries_policy_and_per_slide_hashes() {
        let spec = spec_with_three_slides();
        let output = orchestrator().generate_document(&spec, None).await.unwrap();
        assert_eq!(output.meta["policy_id"], "standard");
        let slides = output.meta["slides"].as_array().unwrap();
        assert_eq!(slides.len(), 3);
        for entry in slides {
            assert!(entry["content_hash"]
                .as_str()
                .unwrap()
                .starts_with("sha256:"));
        }
    }

    #[tokio::test]
    async fn unknown_policy_id_fails() {
        let spec = spec_with_three_slides();
        let err = orchestrator()
            .generate_document(&spec, Some("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Domain(CoreError::Policy(_))));
    }
}
