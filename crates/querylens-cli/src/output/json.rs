//! JSON output formatting.

use anyhow::{Context, Result};
use querylens_core::LineageReport;
use serde::Serialize;

/// Lineage for one input, as printed in lineage mode.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageRecord {
    pub source: String,
    #[serde(flatten)]
    pub report: LineageReport,
}

/// Redaction outcome for one input. `sql` is null when the query was dropped.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactionRecord {
    pub source: String,
    pub sql: Option<String>,
}

/// Format `value` as JSON.
///
/// If `compact` is true, outputs minified JSON without whitespace.
pub fn format_json<T: Serialize + ?Sized>(value: &T, compact: bool) -> Result<String> {
    let json = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    json.context("Failed to serialize output")
}
