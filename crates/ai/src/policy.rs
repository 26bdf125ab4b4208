//! Content AI policies.
//!
//! A policy decides, per slide layout, which intent tag and which
//! prompt template apply. Policies ship as a JSON policy set with a
//! `default_policy_id`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use deckgen_core::CoreError;

use crate::prompts;

/// Per-layout override inside a policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlidePolicy {
    /// Layout this entry applies to; `None` entries are ignored.
    #[serde(default)]
    pub layout: Option<String>,
    #[serde(default = "SlidePolicy::default_intent")]
    pub intent: String,
    #[serde(default)]
    pub prompt_id: Option<String>,
}

impl SlidePolicy {
    fn default_intent() -> String {
        "general".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAiPolicy {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "SlidePolicy::default_intent")]
    pub default_intent: String,
    #[serde(default)]
    pub prompt_id: Option<String>,
    #[serde(default = "ContentAiPolicy::default_model")]
    pub model: String,
    #[serde(default)]
    pub slide_policies: Vec<SlidePolicy>,
}

impl ContentAiPolicy {
    fn default_model() -> String {
        "mock-local".to_string()
    }

    /// Intent for a layout, falling back to the policy default.
    pub fn resolve_intent(&self, layout: &str) -> &str {
        self.slide_policies
            .iter()
            .find(|entry| entry.layout.as_deref() == Some(layout))
            .map(|entry| entry.intent.as_str())
            .unwrap_or(&self.default_intent)
    }

    /// Prompt template for a layout: the layout override's prompt if
    /// one is registered, otherwise the policy's base prompt.
    pub fn resolve_prompt(&self, layout: &str) -> Result<&'static str, CoreError> {
        let override_id = self
            .slide_policies
            .iter()
            .find(|entry| entry.layout.as_deref() == Some(layout))
            .and_then(|entry| entry.prompt_id.as_deref());
        if let Some(prompt_id) = override_id {
            return prompts::get_prompt_template(prompt_id);
        }
        let base_id = self.prompt_id.as_deref().ok_or_else(|| {
            CoreError::Policy(format!("policy '{}' has no prompt_id configured", self.id))
        })?;
        prompts::get_prompt_template(base_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAiPolicySet {
    #[serde(default)]
    pub version: Option<String>,
    pub default_policy_id: String,
    #[serde(default)]
    pub policies: Vec<ContentAiPolicy>,
}

impl ContentAiPolicySet {
    /// The named policy, or the default when no id is given.
    pub fn get_policy(&self, policy_id: Option<&str>) -> Result<&ContentAiPolicy, CoreError> {
        let target = policy_id.unwrap_or(&self.default_policy_id);
        self.policies
            .iter()
            .find(|policy| policy.id == target)
            .ok_or_else(|| CoreError::Policy(format!("policy id '{target}' is not defined")))
    }

    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Policy(format!("cannot read policy file {}: {e}", path.display()))
        })?;
        serde_json::from_str(&source)
            .map_err(|e| CoreError::Policy(format!("invalid policy JSON: {e}")))
    }

    /// Built-in policy set used when no policy file is supplied.
    pub fn builtin() -> Self {
        Self {
            version: Some("1".to_string()),
            default_policy_id: "standard".to_string(),
            policies: vec![ContentAiPolicy {
                id: "standard".to_string(),
                name: "Standard proposal".to_string(),
                description: None,
                default_intent: "content".to_string(),
                prompt_id: Some("content.baseline".to_string()),
                model: "mock-local".to_string(),
                slide_policies: vec![
                    SlidePolicy {
                        layout: Some("Title Slide".to_string()),
                        intent: "cover".to_string(),
                        prompt_id: Some("content.cover".to_string()),
                    },
                    SlidePolicy {
                        layout: Some("Section Header".to_string()),
                        intent: "agenda".to_string(),
                        prompt_id: Some("content.summary".to_string()),
                    },
                ],
            }],
        }
    }
}
