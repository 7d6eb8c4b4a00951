use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::platform::DataPlatform;

/// Environment segment of every dataset identifier the engine emits.
pub const DEFAULT_ENV: &str = "PROD";

/// A physical table referenced by a statement, exactly as written.
///
/// Two tables with the same parts are the same table. Parts that were not
/// written in the SQL are `None`, never the empty string.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub name: String,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            database: None,
            schema: None,
            name: name.into(),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Dotted form of the parts that were written, e.g. `db.schema.name`.
    pub fn to_qualified_string(&self) -> String {
        let mut parts = Vec::with_capacity(3);
        if let Some(ref database) = self.database {
            parts.push(database.as_str());
        }
        if let Some(ref schema) = self.schema {
            parts.push(schema.as_str());
        }
        parts.push(&self.name);
        parts.join(".")
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_qualified_string())
    }
}

/// A table resolved into a platform-aware dataset identifier.
///
/// The identifier is fully qualified (default database and schema are filled
/// in when the SQL left them out), prefixed by the account when one is known,
/// and lower-cased.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct QueriedDataset(String);

impl QueriedDataset {
    pub fn new(
        table: &Table,
        platform: &DataPlatform,
        account: Option<&str>,
        default_database: Option<&str>,
        default_schema: Option<&str>,
    ) -> Self {
        fn non_empty(value: Option<&str>) -> Option<&str> {
            value.map(str::trim).filter(|v| !v.is_empty())
        }

        let database = non_empty(table.database.as_deref()).or(non_empty(default_database));
        let schema = non_empty(table.schema.as_deref()).or(non_empty(default_schema));

        let mut parts = Vec::with_capacity(4);
        if let Some(account) = non_empty(account) {
            parts.push(account);
        }
        if let Some(database) = database {
            parts.push(database);
        }
        if let Some(schema) = schema {
            parts.push(schema);
        }
        parts.push(table.name.as_str());

        let name = parts.join(".").to_lowercase();
        Self(format!(
            "urn:li:dataset:(urn:li:dataPlatform:{},{},{})",
            platform.as_str(),
            name,
            DEFAULT_ENV
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueriedDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_compare_by_value() {
        let a = Table::new("orders").with_schema("public");
        let b = Table::new("orders").with_schema("public");
        assert_eq!(a, b);
        assert_ne!(a, Table::new("orders"));
    }

    #[test]
    fn test_qualified_string_skips_missing_parts() {
        assert_eq!(Table::new("t").to_qualified_string(), "t");
        assert_eq!(
            Table::new("t")
                .with_schema("s")
                .with_database("d")
                .to_qualified_string(),
            "d.s.t"
        );
    }

    #[test]
    fn test_dataset_applies_defaults_and_lowercases() {
        let table = Table::new("Orders");
        let dataset = QueriedDataset::new(
            &table,
            &DataPlatform::Snowflake,
            None,
            Some("ANALYTICS"),
            Some("Public"),
        );
        assert_eq!(
            dataset.as_str(),
            "urn:li:dataset:(urn:li:dataPlatform:snowflake,analytics.public.orders,PROD)"
        );
    }

    #[test]
    fn test_dataset_prefers_written_parts_over_defaults() {
        let table = Table::new("t").with_schema("raw").with_database("lake");
        let dataset = QueriedDataset::new(
            &table,
            &DataPlatform::Bigquery,
            Some("acct"),
            Some("other_db"),
            Some("other_schema"),
        );
        assert_eq!(
            dataset.as_str(),
            "urn:li:dataset:(urn:li:dataPlatform:bigquery,acct.lake.raw.t,PROD)"
        );
    }

    #[test]
    fn test_dataset_trims_blank_defaults() {
        let dataset = QueriedDataset::new(
            &Table::new("t").with_schema("  "),
            &DataPlatform::Postgres,
            Some(" acme "),
            Some(" "),
            Some(" public "),
        );
        assert_eq!(
            dataset.as_str(),
            "urn:li:dataset:(urn:li:dataPlatform:postgres,acme.public.t,PROD)"
        );
    }

    #[test]
    fn test_dataset_ignores_empty_account() {
        let dataset = QueriedDataset::new(
            &Table::new("t"),
            &DataPlatform::Postgres,
            Some(""),
            None,
            None,
        );
        assert_eq!(
            dataset.as_str(),
            "urn:li:dataset:(urn:li:dataPlatform:postgres,t,PROD)"
        );
    }
}
