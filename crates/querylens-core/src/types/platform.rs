use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// The data platform a query was captured from.
///
/// Connectors identify themselves by platform name. Names the engine has no
/// special knowledge of are kept verbatim (lower-cased) in [`DataPlatform::Other`]
/// so they still show up correctly in dataset identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataPlatform {
    Athena,
    Bigquery,
    Clickhouse,
    Databricks,
    Duckdb,
    Hive,
    Mariadb,
    Mssql,
    Mysql,
    Oracle,
    Postgres,
    Presto,
    PrestoOnHive,
    Redshift,
    Snowflake,
    Sqlite,
    Teradata,
    Trino,
    Vertica,
    Other(String),
}

impl DataPlatform {
    /// Resolves a platform from its name, case-insensitively. Never fails.
    pub fn from_name(name: &str) -> Self {
        let normalized = name.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "athena" => Self::Athena,
            "bigquery" => Self::Bigquery,
            "clickhouse" => Self::Clickhouse,
            "databricks" => Self::Databricks,
            "duckdb" => Self::Duckdb,
            "hive" => Self::Hive,
            "mariadb" => Self::Mariadb,
            "mssql" => Self::Mssql,
            "mysql" => Self::Mysql,
            "oracle" => Self::Oracle,
            "postgres" | "postgresql" => Self::Postgres,
            "presto" => Self::Presto,
            "presto-on-hive" => Self::PrestoOnHive,
            "redshift" => Self::Redshift,
            "snowflake" => Self::Snowflake,
            "sqlite" => Self::Sqlite,
            "teradata" => Self::Teradata,
            "trino" => Self::Trino,
            "vertica" => Self::Vertica,
            _ => Self::Other(normalized),
        }
    }

    /// The platform name as used in dataset identifiers.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Athena => "athena",
            Self::Bigquery => "bigquery",
            Self::Clickhouse => "clickhouse",
            Self::Databricks => "databricks",
            Self::Duckdb => "duckdb",
            Self::Hive => "hive",
            Self::Mariadb => "mariadb",
            Self::Mssql => "mssql",
            Self::Mysql => "mysql",
            Self::Oracle => "oracle",
            Self::Postgres => "postgres",
            Self::Presto => "presto",
            Self::PrestoOnHive => "presto-on-hive",
            Self::Redshift => "redshift",
            Self::Snowflake => "snowflake",
            Self::Sqlite => "sqlite",
            Self::Teradata => "teradata",
            Self::Trino => "trino",
            Self::Vertica => "vertica",
            Self::Other(name) => name,
        }
    }
}

impl Default for DataPlatform {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl fmt::Display for DataPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataPlatform {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl From<String> for DataPlatform {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<&str> for DataPlatform {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl From<DataPlatform> for String {
    fn from(platform: DataPlatform) -> Self {
        platform.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(DataPlatform::from_name("Snowflake"), DataPlatform::Snowflake);
        assert_eq!(DataPlatform::from_name(" BIGQUERY "), DataPlatform::Bigquery);
        assert_eq!(
            DataPlatform::from_name("presto-on-hive"),
            DataPlatform::PrestoOnHive
        );
    }

    #[test]
    fn test_unknown_platform_is_kept() {
        let platform = DataPlatform::from_name("Dremio");
        assert_eq!(platform, DataPlatform::Other("dremio".to_string()));
        assert_eq!(platform.as_str(), "dremio");
    }

    #[test]
    fn test_serde_uses_platform_name() {
        let json = serde_json::to_string(&DataPlatform::PrestoOnHive).unwrap();
        assert_eq!(json, "\"presto-on-hive\"");

        let parsed: DataPlatform = serde_json::from_str("\"redshift\"").unwrap();
        assert_eq!(parsed, DataPlatform::Redshift);
    }
}
