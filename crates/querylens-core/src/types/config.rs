//! Configuration for the redaction/filter transform.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Controls how [`crate::process_query`] rewrites or drops statements.
///
/// Built once per crawl run and shared by reference; it is never mutated
/// while queries are being processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedactionConfig {
    /// Replace literals in WHERE clauses and MERGE insert values.
    #[serde(default)]
    pub redact_literals: bool,

    /// Text substituted for every redacted literal (default: `?`).
    #[serde(default = "default_placeholder")]
    pub placeholder: String,

    /// Drop `INSERT ... VALUES` statements that carry no SELECT.
    #[serde(default)]
    pub drop_insert_values: bool,

    /// Drop administrative/session commands.
    #[serde(default)]
    pub drop_command_statements: bool,

    /// Drop statements that cannot be parsed instead of passing them through.
    #[serde(default)]
    pub skip_unparsable: bool,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_literals: false,
            placeholder: default_placeholder(),
            drop_insert_values: false,
            drop_command_statements: false,
            skip_unparsable: false,
        }
    }
}

fn default_placeholder() -> String {
    "?".to_string()
}

impl RedactionConfig {
    /// A config with every transform switched on.
    pub fn strict() -> Self {
        Self {
            redact_literals: true,
            drop_insert_values: true,
            drop_command_statements: true,
            skip_unparsable: true,
            ..Default::default()
        }
    }

    /// Returns true if any transform is requested. When false the statement
    /// is passed through without being parsed.
    pub fn is_active(&self) -> bool {
        self.redact_literals
            || self.drop_insert_values
            || self.drop_command_statements
            || self.skip_unparsable
    }
}
