//! Domain error taxonomy.
//!
//! One variant per failure kind the system distinguishes. Boundary
//! layers (HTTP API, CLI) map these to status codes and exit codes;
//! nothing in this crate knows about either.

/// Domain-level error for all deckgen crates.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Input JSON does not match its schema (parse/shape failure).
    #[error("Schema validation failed: {0}")]
    SchemaValidation(String),

    /// Business-rule validation of a job spec failed. Carries every
    /// offender found, not just the first.
    #[error("Spec validation failed: {}", .0.join("; "))]
    SpecValidation(Vec<String>),

    /// Unknown policy or prompt id.
    #[error("Policy error: {0}")]
    Policy(String),

    /// Unknown LLM provider or missing environment configuration.
    #[error("LLM configuration error: {0}")]
    LlmConfiguration(String),

    /// Optimistic-concurrency check failed (If-Match / ETag mismatch).
    #[error("Revision mismatch: {0}")]
    RevisionMismatch(String),

    /// Mutation attempted on an approved/locked resource.
    #[error("Resource locked: {0}")]
    ResourceLocked(String),

    /// Missing or invalid bearer token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Entity lookup failed.
    #[error("Entity not found: {entity} '{id}'")]
    NotFound { entity: &'static str, id: String },

    /// Resource already exists (duplicate create).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Polisher executable missing, failed, or timed out.
    #[error("Polisher error: {0}")]
    Polisher(String),

    /// A required pipeline artifact is absent from the context.
    #[error("Artifact missing: '{0}'")]
    ArtifactMissing(String),

    /// Content ingestion found cards that are not approved.
    #[error("Unapproved cards present: {}", .0.join(", "))]
    MissingApproval(Vec<String>),

    /// Anything else.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Stable short token for HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::SchemaValidation(_) | CoreError::SpecValidation(_) => "VALIDATION_ERROR",
            CoreError::Policy(_) => "POLICY_ERROR",
            CoreError::LlmConfiguration(_) => "LLM_CONFIGURATION_ERROR",
            CoreError::RevisionMismatch(_) => "REVISION_MISMATCH",
            CoreError::ResourceLocked(_) => "RESOURCE_LOCKED",
            CoreError::Unauthorized(_) => "UNAUTHORIZED",
            CoreError::NotFound { .. } => "NOT_FOUND",
            CoreError::Conflict(_) => "CONFLICT",
            CoreError::Polisher(_) => "POLISHER_ERROR",
            CoreError::ArtifactMissing(_) => "ARTIFACT_MISSING",
            CoreError::MissingApproval(_) => "MISSING_APPROVAL",
            CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
