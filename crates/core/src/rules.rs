//! Validation rule limits.
//!
//! Loaded from a JSON rules file when one is supplied; otherwise the
//! defaults below apply.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "RulesConfig::default_max_title_length")]
    pub max_title_length: usize,
    #[serde(default = "RulesConfig::default_max_bullet_length")]
    pub max_bullet_length: usize,
    #[serde(default = "RulesConfig::default_max_bullet_level")]
    pub max_bullet_level: u8,
    #[serde(default)]
    pub forbidden_words: Vec<String>,
}

impl RulesConfig {
    fn default_max_title_length() -> usize {
        40
    }

    fn default_max_bullet_length() -> usize {
        80
    }

    fn default_max_bullet_level() -> u8 {
        3
    }

    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            CoreError::SchemaValidation(format!(
                "cannot read rules file {}: {e}",
                path.display()
            ))
        })?;
        serde_json::from_str(&source)
            .map_err(|e| CoreError::SchemaValidation(format!("invalid rules JSON: {e}")))
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            max_title_length: Self::default_max_title_length(),
            max_bullet_length: Self::default_max_bullet_length(),
            max_bullet_level: Self::default_max_bullet_level(),
            forbidden_words: Vec::new(),
        }
    }
}
