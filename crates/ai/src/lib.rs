//! LLM clients, policies, and content orchestration.
//!
//! Everything AI-facing lives here: the provider-agnostic client
//! contract with mock and Azure implementations, the policy set that
//! decides intent and prompt per slide layout, the prompt registry,
//! the content orchestrator, and the slide-match client the aligner
//! uses.

pub mod client;
pub mod matcher;
pub mod orchestrator;
pub mod policy;
pub mod prompts;

use deckgen_core::CoreError;

/// Errors raised by LLM clients and orchestration.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Unknown provider or missing environment configuration.
    #[error("LLM configuration error: {0}")]
    Configuration(String),

    #[error("LLM request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("LLM response could not be interpreted: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Domain(#[from] CoreError),
}

impl From<LlmError> for CoreError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Configuration(msg) => CoreError::LlmConfiguration(msg),
            LlmError::Request(e) => CoreError::Internal(e.to_string()),
            LlmError::InvalidResponse(msg) => CoreError::Internal(msg),
            LlmError::Domain(e) => e,
        }
    }
}

pub use client::{create_llm_client, AzureLlmClient, LlmClient, LlmCompletion, MockLlmClient};
pub use orchestrator::{ContentAiOrchestrator, GenerationLogEntry, GenerationOutput};
pub use policy::{ContentAiPolicy, ContentAiPolicySet, SlidePolicy};
