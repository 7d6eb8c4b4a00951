use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::platform::DataPlatform;

/// SQL dialect for parsing and printing.
///
/// Each variant maps onto one sqlparser grammar. Platforms whose grammar is
/// not modelled fall back to [`Dialect::Generic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Generic,
    Ansi,
    Bigquery,
    Clickhouse,
    Databricks,
    Duckdb,
    Hive,
    Mssql,
    Mysql,
    Postgres,
    Redshift,
    Snowflake,
    Sqlite,
}

/// Picks the grammar used to parse queries captured from `platform`.
///
/// Platforms without a dedicated grammar (Athena, Trino, Oracle, and any
/// unrecognized name) parse with [`Dialect::Generic`].
pub fn dialect_for(platform: &DataPlatform) -> Dialect {
    match platform {
        DataPlatform::Snowflake => Dialect::Snowflake,
        DataPlatform::Bigquery => Dialect::Bigquery,
        DataPlatform::Redshift => Dialect::Redshift,
        DataPlatform::Postgres | DataPlatform::Vertica => Dialect::Postgres,
        DataPlatform::Mysql | DataPlatform::Mariadb => Dialect::Mysql,
        DataPlatform::Mssql => Dialect::Mssql,
        DataPlatform::Databricks => Dialect::Databricks,
        DataPlatform::Hive | DataPlatform::PrestoOnHive => Dialect::Hive,
        DataPlatform::Clickhouse => Dialect::Clickhouse,
        DataPlatform::Duckdb => Dialect::Duckdb,
        DataPlatform::Sqlite => Dialect::Sqlite,
        DataPlatform::Athena
        | DataPlatform::Trino
        | DataPlatform::Presto
        | DataPlatform::Oracle
        | DataPlatform::Teradata
        | DataPlatform::Other(_) => Dialect::Generic,
    }
}

impl Dialect {
    pub fn to_sqlparser_dialect(&self) -> Box<dyn sqlparser::dialect::Dialect> {
        use sqlparser::dialect::{
            AnsiDialect, BigQueryDialect, ClickHouseDialect, DatabricksDialect, DuckDbDialect,
            GenericDialect, HiveDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect,
            RedshiftSqlDialect, SQLiteDialect, SnowflakeDialect,
        };
        match self {
            Self::Generic => Box::new(GenericDialect {}),
            Self::Ansi => Box::new(AnsiDialect {}),
            Self::Bigquery => Box::new(BigQueryDialect {}),
            Self::Clickhouse => Box::new(ClickHouseDialect {}),
            Self::Databricks => Box::new(DatabricksDialect {}),
            Self::Duckdb => Box::new(DuckDbDialect {}),
            Self::Hive => Box::new(HiveDialect {}),
            Self::Mssql => Box::new(MsSqlDialect {}),
            Self::Mysql => Box::new(MySqlDialect {}),
            Self::Postgres => Box::new(PostgreSqlDialect {}),
            Self::Redshift => Box::new(RedshiftSqlDialect {}),
            Self::Snowflake => Box::new(SnowflakeDialect {}),
            Self::Sqlite => Box::new(SQLiteDialect {}),
        }
    }
}
