use querylens_core::{
    extract_table_level_lineage, parse_sql_with_dialect, process_query, DataPlatform, Dialect,
    RedactionConfig,
};
use proptest::prelude::*;

const PLATFORMS: &[&str] = &[
    "snowflake", "bigquery", "redshift", "postgres", "mysql", "mssql", "databricks", "hive",
    "clickhouse", "duckdb", "sqlite", "generic",
];

fn urn(name: &str) -> String {
    format!("urn:li:dataset:(urn:li:dataPlatform:postgres,{name},PROD)")
}

proptest! {
    #[test]
    fn insert_select_lineage_finds_both_sides(
        target in "t_[a-z0-9]{1,8}",
        left in "t_[a-z0-9]{1,8}",
        right in "t_[a-z0-9]{1,8}",
        col in "c_[a-z]{1,6}",
    ) {
        prop_assume!(target != left && target != right && left != right);

        let sql = format!(
            "INSERT INTO {target} SELECT l.{col} FROM {left} l JOIN {right} r ON l.{col} = r.{col}"
        );
        let result = extract_table_level_lineage(
            &sql,
            &DataPlatform::Postgres,
            None,
            None,
            None,
            None,
        );

        let sources: Vec<String> = result.sources.iter().map(|d| d.as_str().to_string()).collect();
        let mut expected = vec![urn(&left), urn(&right)];
        expected.sort();
        prop_assert_eq!(sources, expected);
        prop_assert_eq!(result.targets.len(), 1);
    }

    #[test]
    fn printed_statements_reparse_to_the_same_text(
        table in "t_[a-z0-9]{1,8}",
        col in "c_[a-z]{1,6}",
        number in 0u32..100_000,
        text in "[a-z ]{0,12}",
    ) {
        let sql = format!(
            "SELECT {col} FROM {table} WHERE {col} = {number} OR {col} = '{text}'"
        );
        let first = parse_sql_with_dialect(&sql, Dialect::Generic).unwrap();
        let printed = first[0].to_string();
        let second = parse_sql_with_dialect(&printed, Dialect::Generic).unwrap();
        prop_assert_eq!(printed, second[0].to_string());
    }

    #[test]
    fn redaction_is_idempotent(
        table in "t_[a-z0-9]{1,8}",
        col in "c_[a-z]{1,6}",
        number in 0u32..100_000,
        text in "[a-z]{0,12}",
        placeholder in prop_oneof![
            Just("?".to_string()),
            Just("$1".to_string()),
            "[A-Z]{1,10}",
        ],
        platform in prop::sample::select(PLATFORMS),
        skip_unparsable in any::<bool>(),
    ) {
        let platform = DataPlatform::from_name(platform);
        let config = RedactionConfig {
            redact_literals: true,
            placeholder,
            skip_unparsable,
            ..Default::default()
        };
        let sql = format!(
            "UPDATE {table} SET {col} = 1 WHERE {col} > {number} AND {col} <> '{text}'"
        );

        let once = process_query(&sql, &platform, &config, None);
        prop_assert!(once.is_some(), "{} dropped {}", platform, sql);
        let twice = once
            .as_deref()
            .and_then(|text| process_query(text, &platform, &config, None));
        prop_assert_eq!(once, twice);
    }
}
