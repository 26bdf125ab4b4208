//! Business-rule validation of a job spec.
//!
//! Runs after schema validation. Collects every violation it finds and
//! fails with the whole list, so a reviewer can fix a spec in one pass.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use deckgen_core::rules::RulesConfig;
use deckgen_core::spec::JobSpec;
use deckgen_core::CoreError;

use crate::context::PipelineContext;
use crate::step::PipelineStep;
use crate::PipelineError;

pub struct SpecValidatorStep {
    rules: RulesConfig,
}

impl SpecValidatorStep {
    pub fn new(rules: RulesConfig) -> Self {
        Self { rules }
    }

    fn collect_violations(&self, spec: &JobSpec) -> Vec<String> {
        let mut violations = Vec::new();

        if spec.slides.is_empty() {
            violations.push("spec defines no slides".to_string());
        }

        for slide in &spec.slides {
            if let Some(title) = &slide.title {
                if title.chars().count() > self.rules.max_title_length {
                    violations.push(format!(
                        "slide '{}' title exceeds {} characters",
                        slide.id, self.rules.max_title_length
                    ));
                }
            }
            for bullet in slide.iter_bullets() {
                if bullet.text.chars().count() > self.rules.max_bullet_length {
                    violations.push(format!(
                        "slide '{}' bullet '{}' exceeds {} characters",
                        slide.id, bullet.id, self.rules.max_bullet_length
                    ));
                }
                if bullet.level > self.rules.max_bullet_level {
                    violations.push(format!(
                        "slide '{}' bullet '{}' exceeds nesting level {}",
                        slide.id, bullet.id, self.rules.max_bullet_level
                    ));
                }
            }
            for word in &self.rules.forbidden_words {
                if word.is_empty() {
                    continue;
                }
                if slide
                    .title
                    .as_deref()
                    .map(|title| title.contains(word.as_str()))
                    .unwrap_or(false)
                {
                    violations.push(format!(
                        "slide '{}' title contains forbidden word '{word}'",
                        slide.id
                    ));
                }
                for bullet in slide.iter_bullets() {
                    if bullet.text.contains(word.as_str()) {
                        violations.push(format!(
                            "slide '{}' bullet '{}' contains forbidden word '{word}'",
                            slide.id, bullet.id
                        ));
                    }
                }
            }
        }

        violations
    }
}

#[async_trait]
impl PipelineStep for SpecValidatorStep {
    fn name(&self) -> &'static str {
        "validator"
    }

    async fn run(&self, context: &mut PipelineContext) -> Result<(), PipelineError> {
        let spec = context.spec();
        debug!(slides = spec.slides.len(), "validating spec");
        let violations = self.collect_violations(spec);
        if !violations.is_empty() {
            return Err(CoreError::SpecValidation(violations).into());
        }
        context.publish(
            "validation_report",
            &json!({
                "slides": context.spec().slides.len(),
                "violations": [],
            }),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn spec(value: serde_json::Value) -> JobSpec {
        serde_json::from_value(value).unwrap()
    }

    fn rules() -> RulesConfig {
        RulesConfig {
            max_title_length: 10,
            max_bullet_length: 20,
            max_bullet_level: 1,
            forbidden_words: vec!["secret".to_string()],
        }
    }

    #[tokio::test]
    async fn clean_spec_publishes_a_report() {
        let step = SpecValidatorStep::new(rules());
        let mut context = PipelineContext::new(
            spec(serde_json::json!({
                "meta": {"schema_version": "1.1", "title": "T"},
                "auth": {"created_by": "tester"},
                "slides": [{"id": "s1", "layout": "Title Slide", "title": "Plan"}]
            })),
            "/tmp",
        );
        step.run(&mut context).await.unwrap();
        assert!(context.contains("validation_report"));
    }

    #[tokio::test]
    async fn all_violations_are_reported_together() {
        let step = SpecValidatorStep::new(rules());
        let mut context = PipelineContext::new(
            spec(serde_json::json!({
                "meta": {"schema_version": "1.1", "title": "T"},
                "auth": {"created_by": "tester"},
                "slides": [{
                    "id": "s1",
                    "layout": "Title and Content",
                    "title": "A title that is clearly too long",
                    "bullets": [{"items": [
                        {"id": "b1", "text": "Contains a secret roadmap figure here", "level": 3}
                    ]}]
                }]
            })),
            "/tmp",
        );
        let err = step.run(&mut context).await.unwrap_err();
        let violations = match err {
            PipelineError::Domain(CoreError::SpecValidation(list)) => list,
            other => panic!("unexpected error: {other}"),
        };
        // title length + bullet length + bullet level + forbidden word
        assert_eq!(violations.len(), 4);
    }

    #[tokio::test]
    async fn bullet_nesting_above_the_limit_is_flagged() {
        let step = SpecValidatorStep::new(rules());
        let mut context = PipelineContext::new(
            spec(serde_json::json!({
                "meta": {"schema_version": "1.1", "title": "T"},
                "auth": {"created_by": "tester"},
                "slides": [{
                    "id": "s1",
                    "layout": "Title and Content",
                    "bullets": [{"items": [
                        {"id": "b1", "text": "Nested point", "level": 2}
                    ]}]
                }]
            })),
            "/tmp",
        );
        let err = step.run(&mut context).await.unwrap_err();
        let violations = match err {
            PipelineError::Domain(CoreError::SpecValidation(list)) => list,
            other => panic!("unexpected error: {other}"),
        };
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("nesting level 1"));
    }

    #[tokio::test]
    async fn empty_spec_fails() {
        let step = SpecValidatorStep::new(RulesConfig::default());
        let mut context = PipelineContext::new(
            spec(serde_json::json!({
                "meta": {"schema_version": "1.1", "title": "T"},
                "auth": {"created_by": "tester"},
                "slides": []
            })),
            "/tmp",
        );
        assert_matches!(
            step.run(&mut context).await,
            Err(PipelineError::Domain(CoreError::SpecValidation(_)))
        );
    }
}
