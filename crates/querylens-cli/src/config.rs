//! Redaction settings loaded from a JSON file.

use anyhow::{Context, Result};
use querylens_core::RedactionConfig;
use std::path::Path;

/// Loads a [`RedactionConfig`] from `path`, or the defaults when no file is
/// given. Missing keys take their default values.
pub fn load_redaction_config(path: Option<&Path>) -> Result<RedactionConfig> {
    let Some(path) = path else {
        return Ok(RedactionConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid redaction config: {}", path.display()))
}
