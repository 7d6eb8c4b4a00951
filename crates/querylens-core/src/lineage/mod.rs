//! Table-level lineage extraction.
//!
//! Pipeline: bad-query filter → dialect lookup → preprocess → parse → per
//! statement {targets, reduce → sources, CREATE LIKE/CLONE} → dataset
//! identifiers, unioned across statements. Text the parser rejects still
//! gets the LIKE/CLONE match.

mod naming;
pub mod reduce;
pub mod sources;
pub mod targets;

use std::collections::{BTreeSet, HashSet};

use sqlparser::ast::Statement;
#[cfg(feature = "tracing")]
use tracing::{debug, trace, warn};

use crate::classify::{classify, StatementKind};
use crate::error::LineageError;
use crate::filter::matching_signature;
use crate::parser::parse_sql_with_dialect;
use crate::preprocess::preprocess;
use crate::types::{
    dialect_for, DataPlatform, Dialect, LineageReport, LineageRequest, LineageResult,
    QueriedDataset, Table,
};
use crate::worker::run_isolated;

pub use reduce::{to_read_fragment, ReadFragment};
pub use sources::{find_sources, MAX_RESOLUTION_DEPTH};
pub use targets::{find_targets, match_special_create, match_special_create_text, SpecialCreate};

/// Tables read and written by `sql`, as dataset identifiers.
///
/// Never fails: unparsable or unsupported input yields an empty result, and
/// the reason is logged.
pub fn extract_table_level_lineage(
    sql: &str,
    platform: &DataPlatform,
    account: Option<&str>,
    statement_type_hint: Option<&str>,
    default_database: Option<&str>,
    default_schema: Option<&str>,
) -> LineageResult {
    let request = LineageRequest {
        sql: sql.to_string(),
        platform: platform.clone(),
        account: account.map(str::to_string),
        statement_type_hint: statement_type_hint.map(str::to_string),
        default_database: default_database.map(str::to_string),
        default_schema: default_schema.map(str::to_string),
        query_id: None,
    };
    analyze_table_level_lineage(&request).result
}

/// Same as [`extract_table_level_lineage`], keeping the statement kinds and
/// the reason for an empty result.
pub fn analyze_table_level_lineage(request: &LineageRequest) -> LineageReport {
    if !request.hint_allows_analysis() {
        return LineageReport::default();
    }

    match run_isolated(|| analyze(request)) {
        Ok(report) => report,
        Err(err) => {
            log_failure(&err, request.query_id.as_deref());
            LineageReport::failed(err.to_string())
        }
    }
}

fn analyze(request: &LineageRequest) -> Result<LineageReport, LineageError> {
    if let Some(signature) = matching_signature(&request.sql) {
        #[cfg(feature = "tracing")]
        debug!(
            query_id = request.query_id.as_deref().unwrap_or_default(),
            signature, "skipping known-unparsable statement"
        );
        return Ok(LineageReport::failed(format!(
            "statement matches known-unparsable signature `{signature}`"
        )));
    }

    let dialect = dialect_for(&request.platform);
    let sql = preprocess(&request.sql, &request.platform);

    let statements = match parse_sql_with_dialect(&sql, dialect) {
        Ok(statements) => statements,
        Err(err) => {
            let Some(special) = match_special_create_text(&sql, dialect)? else {
                return Err(err.into());
            };
            let mut report = LineageReport::default();
            report.statement_kinds.push(StatementKind::Ddl);
            report.result.merge(special_lineage(special, request));
            return Ok(report);
        }
    };

    let mut report = LineageReport::default();
    for stmt in &statements {
        report.statement_kinds.push(classify(stmt));
        report.result.merge(statement_lineage(stmt, dialect, request)?);
    }
    Ok(report)
}

fn statement_lineage(
    stmt: &Statement,
    dialect: Dialect,
    request: &LineageRequest,
) -> Result<LineageResult, LineageError> {
    let mut sources = find_sources(stmt)?;
    let mut targets = find_targets(stmt);
    if let Some(special) = match_special_create(stmt, dialect)? {
        sources.insert(special.source);
        targets.insert(special.target);
    }
    Ok(LineageResult {
        sources: to_datasets(sources, request),
        targets: to_datasets(targets, request),
    })
}

fn special_lineage(special: SpecialCreate, request: &LineageRequest) -> LineageResult {
    LineageResult {
        sources: to_datasets(HashSet::from([special.source]), request),
        targets: to_datasets(HashSet::from([special.target]), request),
    }
}

fn to_datasets(tables: HashSet<Table>, request: &LineageRequest) -> BTreeSet<QueriedDataset> {
    tables
        .iter()
        .map(|table| {
            QueriedDataset::new(
                table,
                &request.platform,
                request.account.as_deref(),
                request.default_database.as_deref(),
                request.default_schema.as_deref(),
            )
        })
        .collect()
}

fn log_failure(err: &LineageError, query_id: Option<&str>) {
    #[cfg(feature = "tracing")]
    {
        let query_id = query_id.unwrap_or_default();
        if err.is_recursion_limit() {
            trace!(query_id, error = %err, "lineage extraction hit max recursion");
        } else if let LineageError::Parse(parse_err) = err {
            debug!(query_id, error = %parse_err, "failed to parse statement for lineage");
        } else {
            warn!(query_id, error = %err, "lineage extraction failed");
        }
    }
    #[cfg(not(feature = "tracing"))]
    let _ = (err, query_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urn(platform: &str, name: &str) -> String {
        format!("urn:li:dataset:(urn:li:dataPlatform:{platform},{name},PROD)")
    }

    fn names(set: &BTreeSet<QueriedDataset>) -> Vec<String> {
        set.iter().map(|d| d.as_str().to_string()).collect()
    }

    #[test]
    fn test_insert_select_lineage() {
        let result = extract_table_level_lineage(
            "INSERT INTO tab1 SELECT * FROM tab2",
            &DataPlatform::Snowflake,
            None,
            None,
            Some("db"),
            Some("public"),
        );
        assert_eq!(names(&result.sources), vec![urn("snowflake", "db.public.tab2")]);
        assert_eq!(names(&result.targets), vec![urn("snowflake", "db.public.tab1")]);
    }

    #[test]
    fn test_disallowed_hint_short_circuits() {
        let result = extract_table_level_lineage(
            "INSERT INTO tab1 SELECT * FROM tab2",
            &DataPlatform::Snowflake,
            None,
            Some("SELECT"),
            None,
            None,
        );
        assert!(result.is_empty());
    }

    #[test]
    fn test_unparsable_yields_empty_report_with_failure() {
        let request = LineageRequest::new("SELEKT FROM WHERE", DataPlatform::Postgres);
        let report = analyze_table_level_lineage(&request);
        assert!(report.result.is_empty());
        assert!(report.failure.unwrap().starts_with("Parse error (Postgres)"));
    }

    #[test]
    fn test_known_unparsable_is_skipped() {
        let request = LineageRequest::new("PUT file:///tmp/x.csv @stage", DataPlatform::Snowflake);
        let report = analyze_table_level_lineage(&request);
        assert!(report.result.is_empty());
        assert!(report.statement_kinds.is_empty());
        assert!(report.failure.unwrap().contains("snowflake_stage_put"));
    }

    #[test]
    fn test_multi_statement_union() {
        let request = LineageRequest::new(
            "INSERT INTO a SELECT * FROM b; INSERT INTO c SELECT * FROM d",
            DataPlatform::Postgres,
        );
        let report = analyze_table_level_lineage(&request);
        assert_eq!(
            names(&report.result.targets),
            vec![urn("postgres", "a"), urn("postgres", "c")]
        );
        assert_eq!(
            names(&report.result.sources),
            vec![urn("postgres", "b"), urn("postgres", "d")]
        );
        assert_eq!(
            report.statement_kinds,
            vec![StatementKind::Dml, StatementKind::Dml]
        );
    }

    #[test]
    fn test_clone_after_leading_comment() {
        let result = extract_table_level_lineage(
            "/* dbt */ CREATE TABLE tab2 CLONE tab1",
            &DataPlatform::Snowflake,
            None,
            None,
            None,
            None,
        );
        assert_eq!(names(&result.sources), vec![urn("snowflake", "tab1")]);
        assert_eq!(names(&result.targets), vec![urn("snowflake", "tab2")]);
    }

    #[test]
    fn test_like_is_unioned_with_following_statements() {
        let request = LineageRequest::new(
            "CREATE TABLE a LIKE b; INSERT INTO c SELECT * FROM d",
            DataPlatform::Snowflake,
        );
        let report = analyze_table_level_lineage(&request);
        assert_eq!(
            names(&report.result.sources),
            vec![urn("snowflake", "b"), urn("snowflake", "d")]
        );
        assert_eq!(
            names(&report.result.targets),
            vec![urn("snowflake", "a"), urn("snowflake", "c")]
        );
        assert_eq!(
            report.statement_kinds,
            vec![StatementKind::Ddl, StatementKind::Dml]
        );
    }

    #[test]
    fn test_unparsable_clone_tail_uses_text_match() {
        let result = extract_table_level_lineage(
            "-- restore\nCREATE TABLE t2 CLONE t1 AT (TIMESTAMP => '2024-01-01'::timestamp)",
            &DataPlatform::Snowflake,
            None,
            None,
            None,
            None,
        );
        assert_eq!(names(&result.sources), vec![urn("snowflake", "t1")]);
        assert_eq!(names(&result.targets), vec![urn("snowflake", "t2")]);
    }
}
