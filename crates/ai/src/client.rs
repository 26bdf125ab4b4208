//! Provider-agnostic LLM client.
//!
//! One capability: given a prompt and an optional model hint, return
//! text plus token usage. The mock client is the default provider so
//! every flow works offline; the Azure client speaks the Responses API
//! over `reqwest`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::LlmError;

pub const PROVIDER_ENV: &str = "PPTX_LLM_PROVIDER";
pub const AZURE_ENDPOINT_ENV: &str = "AZURE_OPENAI_ENDPOINT";
pub const AZURE_API_KEY_ENV: &str = "AZURE_OPENAI_API_KEY";
pub const AZURE_DEPLOYMENT_ENV: &str = "AZURE_OPENAI_DEPLOYMENT";
pub const AZURE_API_VERSION_ENV: &str = "AZURE_OPENAI_API_VERSION";
const DEFAULT_AZURE_API_VERSION: &str = "2024-02-15-preview";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt: u64,
    #[serde(default)]
    pub completion: u64,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmCompletion {
    pub text: String,
    pub model: String,
    #[serde(default)]
    pub usage: TokenUsage,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        model_hint: Option<&str>,
    ) -> Result<LlmCompletion, LlmError>;
}

/// Build the client named by `PPTX_LLM_PROVIDER`.
///
/// Unset or `mock` selects the mock client; `azure`/`azure-openai`
/// selects the Azure client configured from the environment. Anything
/// else is a configuration error.
pub fn create_llm_client() -> Result<Arc<dyn LlmClient>, LlmError> {
    let provider = std::env::var(PROVIDER_ENV)
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    debug!(provider = %provider, "LLM provider resolved");
    match provider.as_str() {
        "" | "mock" | "mock-local" => Ok(Arc::new(MockLlmClient)),
        "azure" | "azure-openai" => Ok(Arc::new(AzureLlmClient::from_env()?)),
        other => Err(LlmError::Configuration(format!(
            "unknown LLM provider: {other}"
        ))),
    }
}

/// Deterministic offline client: echoes the prompt back.
pub struct MockLlmClient;

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(
        &self,
        prompt: &str,
        model_hint: Option<&str>,
    ) -> Result<LlmCompletion, LlmError> {
        Ok(LlmCompletion {
            text: prompt.to_string(),
            model: model_hint.unwrap_or("mock-local").to_string(),
            usage: TokenUsage::default(),
        })
    }
}

/// Azure OpenAI Responses API client.
#[derive(Debug)]
pub struct AzureLlmClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
}

/// Strip trailing slashes and any `/openai[/responses]` path segment
/// an operator may have pasted from the portal.
fn normalize_endpoint(raw: &str) -> String {
    let mut endpoint = raw.trim_end_matches('/').to_string();
    loop {
        let lowered = endpoint.to_lowercase();
        let mut stripped = false;
        for suffix in ["/openai/responses", "/openai"] {
            if lowered.ends_with(suffix) {
                endpoint.truncate(endpoint.len() - suffix.len());
                stripped = true;
                break;
            }
        }
        if !stripped {
            break;
        }
    }
    endpoint
}

fn require_env(name: &str) -> Result<String, LlmError> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| LlmError::Configuration(format!("{name} is not set")))
}

impl AzureLlmClient {
    pub fn from_env() -> Result<Self, LlmError> {
        let endpoint = normalize_endpoint(&require_env(AZURE_ENDPOINT_ENV)?);
        let api_key = require_env(AZURE_API_KEY_ENV)?;
        let deployment = require_env(AZURE_DEPLOYMENT_ENV)?;
        let api_version = std::env::var(AZURE_API_VERSION_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string());
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
            api_key,
            deployment,
            api_version,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/openai/responses?api-version={}",
            self.endpoint, self.api_version
        )
    }
}

#[async_trait]
impl LlmClient for AzureLlmClient {
    async fn complete(
        &self,
        prompt: &str,
        model_hint: Option<&str>,
    ) -> Result<LlmCompletion, LlmError> {
        let model = model_hint.unwrap_or(&self.deployment);
        // Two-element input; the user element carries the raw prompt.
        // No response-format hint: callers parse the text themselves.
        let body = json!({
            "model": model,
            "input": [
                {
                    "role": "system",
                    "content": "You are a helpful assistant that returns JSON only.",
                },
                {
                    "role": "user",
                    "content": prompt,
                },
            ],
        });

        let response = self
            .http
            .post(self.url())
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let payload: serde_json::Value = response.json().await?;

        let mut texts: Vec<String> = Vec::new();
        if let Some(output) = payload.get("output").and_then(|v| v.as_array()) {
            for item in output {
                if let Some(content) = item.get("content").and_then(|v| v.as_array()) {
                    for entry in content {
                        if let Some(text) = entry.get("text").and_then(|v| v.as_str()) {
                            texts.push(text.to_string());
                        }
                    }
                }
            }
        }
        if texts.is_empty() {
            if let Some(text) = payload.get("output_text").and_then(|v| v.as_str()) {
                texts.push(text.to_string());
            }
        }
        if texts.is_empty() {
            return Err(LlmError::InvalidResponse(
                "response carried no output text".to_string(),
            ));
        }

        let usage = payload
            .get("usage")
            .map(|usage| TokenUsage {
                prompt: usage.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
                completion: usage
                    .get("completion_tokens")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0),
                total: usage.get("total_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
            })
            .unwrap_or_default();

        Ok(LlmCompletion {
            text: texts.concat(),
            model: self.deployment.clone(),
            usage,
        })
    }
}
