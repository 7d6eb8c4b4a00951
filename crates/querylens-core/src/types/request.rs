//! Request types for table-level lineage extraction.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::platform::DataPlatform;

/// Statement type hints that can produce a write target.
///
/// Query-history APIs often report the statement type alongside the text. A
/// hint outside this list means the statement cannot write a table, so the
/// engine skips parsing it.
pub const ALLOWED_STATEMENT_TYPE_HINTS: &[&str] = &["CREATE", "INSERT", "UPDATE", "MERGE", "COPY"];

/// A single query to analyze, plus the context a connector knows about it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineageRequest {
    /// Raw SQL text as captured from the platform.
    pub sql: String,

    /// Platform that produced the query.
    #[schemars(with = "String")]
    pub platform: DataPlatform,

    /// Platform instance / account, prefixed onto every dataset identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,

    /// Statement type reported by the platform (e.g. `INSERT`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_type_hint: Option<String>,

    /// Database applied to table references that do not name one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_database: Option<String>,

    /// Schema applied to table references that do not name one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_schema: Option<String>,

    /// Platform query id, used for log context only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,
}

impl LineageRequest {
    pub fn new(sql: impl Into<String>, platform: DataPlatform) -> Self {
        Self {
            sql: sql.into(),
            platform,
            ..Default::default()
        }
    }

    /// Returns false when the hint rules out any write target.
    pub fn hint_allows_analysis(&self) -> bool {
        match self.statement_type_hint.as_deref() {
            None => true,
            Some(hint) => {
                let hint = hint.trim();
                ALLOWED_STATEMENT_TYPE_HINTS
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(hint))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_hint_allows_analysis() {
        let request = LineageRequest::new("SELECT 1", DataPlatform::Snowflake);
        assert!(request.hint_allows_analysis());
    }

    #[test]
    fn test_hint_is_case_insensitive() {
        let mut request = LineageRequest::new("INSERT INTO t SELECT 1", DataPlatform::Snowflake);
        request.statement_type_hint = Some("insert".to_string());
        assert!(request.hint_allows_analysis());

        request.statement_type_hint = Some("SELECT".to_string());
        assert!(!request.hint_allows_analysis());
    }

    #[test]
    fn test_deserialize_request_defaults() {
        let json = r#"{"sql": "SELECT * FROM t", "platform": "redshift"}"#;
        let request: LineageRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.platform, DataPlatform::Redshift);
        assert!(request.account.is_none());
        assert!(request.query_id.is_none());
    }
}
