//! Response types for table-level lineage extraction.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::table::QueriedDataset;
use crate::classify::StatementKind;

/// Tables a statement reads from and writes to.
///
/// Both sides are sets: a table referenced several times (say, in two
/// branches of a UNION) appears once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineageResult {
    pub sources: BTreeSet<QueriedDataset>,
    pub targets: BTreeSet<QueriedDataset>,
}

impl LineageResult {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() && self.targets.is_empty()
    }

    /// Folds another statement's lineage into this one.
    pub fn merge(&mut self, other: LineageResult) {
        self.sources.extend(other.sources);
        self.targets.extend(other.targets);
    }
}

/// A [`LineageResult`] plus the diagnostics gathered while computing it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineageReport {
    pub result: LineageResult,

    /// Classification of each parsed statement, in input order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statement_kinds: Vec<StatementKind>,

    /// Why analysis degraded to an empty result, if it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl LineageReport {
    pub fn failed(failure: impl Into<String>) -> Self {
        Self {
            failure: Some(failure.into()),
            ..Default::default()
        }
    }
}
