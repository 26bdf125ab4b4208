//! RFC-6902-style JSON-Patch operations.
//!
//! Auto-fix proposals travel as arrays of these operations. Paths are
//! absolute and must begin with `/`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchOp {
    Add,
    Replace,
    Remove,
    Move,
    Copy,
    Test,
}

/// One patch operation against a job spec document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonPatchOperation {
    pub op: PatchOp,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl JsonPatchOperation {
    pub fn replace(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            op: PatchOp::Replace,
            path: path.into(),
            value: Some(value),
            from: None,
        }
    }

    /// Paths must be absolute JSON pointers.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.path.starts_with('/') {
            return Err(CoreError::SchemaValidation(format!(
                "patch path '{}' must begin with '/'",
                self.path
            )));
        }
        Ok(())
    }
}

/// An auto-fix proposal: one named, non-empty patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoFixProposal {
    pub patch_id: String,
    pub description: String,
    pub patch: Vec<JsonPatchOperation>,
}

impl AutoFixProposal {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.patch.is_empty() {
            return Err(CoreError::SchemaValidation(format!(
                "auto-fix proposal '{}' has an empty patch",
                self.patch_id
            )));
        }
        for op in &self.patch {
            op.validate()?;
        }
        Ok(())
    }
}
