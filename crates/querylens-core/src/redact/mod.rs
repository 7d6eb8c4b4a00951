//! Literal redaction and statement filtering for persisted query text.
//!
//! The transform parses its own private copy of the statement, so nothing it
//! rewrites is visible to lineage extraction.

mod literals;

use sqlparser::ast::Statement;
#[cfg(feature = "tracing")]
use tracing::debug;

use crate::classify::{classify, is_insert_values, StatementKind};
use crate::error::{LineageError, ParseError};
use crate::filter::is_known_unparsable;
use crate::parser::parse_sql_with_dialect;
use crate::preprocess::preprocess;
use crate::types::{dialect_for, DataPlatform, Dialect, RedactionConfig};
use crate::worker::run_isolated;

pub use literals::{is_bind_placeholder, placeholder_value, redact_statement};

/// Separator placed between re-serialized statements.
pub const STATEMENT_SEPARATOR: &str = ";\n";

/// Rewrites `sql` according to `config`.
///
/// Returns `None` when the statement should not be persisted at all, and the
/// (possibly rewritten) text otherwise. `query_id` is only used in logs.
pub fn process_query(
    sql: &str,
    platform: &DataPlatform,
    config: &RedactionConfig,
    query_id: Option<&str>,
) -> Option<String> {
    if !config.is_active() || is_known_unparsable(sql) {
        return Some(sql.to_string());
    }

    match run_isolated(|| transform(sql, platform, config)) {
        Ok(Transformed::Kept(text)) => Some(text),
        Ok(Transformed::Dropped(reason)) => {
            #[cfg(feature = "tracing")]
            debug!(
                query_id = query_id.unwrap_or_default(),
                reason, "dropping statement"
            );
            #[cfg(not(feature = "tracing"))]
            let _ = reason;
            None
        }
        Err(err) => {
            #[cfg(feature = "tracing")]
            debug!(
                query_id = query_id.unwrap_or_default(),
                error = %err,
                skip = config.skip_unparsable,
                "could not parse statement for redaction"
            );
            #[cfg(not(feature = "tracing"))]
            let _ = (&err, query_id);
            (!config.skip_unparsable).then(|| sql.to_string())
        }
    }
}

enum Transformed {
    Kept(String),
    Dropped(&'static str),
}

fn transform(
    sql: &str,
    platform: &DataPlatform,
    config: &RedactionConfig,
) -> Result<Transformed, LineageError> {
    let dialect = dialect_for(platform);
    let mut statements = parse_for_redaction(sql, platform, dialect)?;

    if let Some(reason) = statements.iter().find_map(|stmt| drop_reason(stmt, config)) {
        return Ok(Transformed::Dropped(reason));
    }

    if config.redact_literals {
        let replacement = placeholder_value(&config.placeholder, dialect);
        for stmt in &mut statements {
            redact_statement(stmt, &replacement);
        }
    }

    Ok(Transformed::Kept(
        statements
            .iter()
            .map(Statement::to_string)
            .collect::<Vec<_>>()
            .join(STATEMENT_SEPARATOR),
    ))
}

fn parse_for_redaction(
    sql: &str,
    platform: &DataPlatform,
    dialect: Dialect,
) -> Result<Vec<Statement>, LineageError> {
    let statements = parse_sql_with_dialect(&preprocess(sql, platform), dialect)?;
    if statements.is_empty() {
        return Err(ParseError::new("no statements in input")
            .with_dialect(dialect)
            .into());
    }
    Ok(statements)
}

/// Why `stmt` must not be persisted, if it must not.
fn drop_reason(stmt: &Statement, config: &RedactionConfig) -> Option<&'static str> {
    if config.drop_insert_values && is_insert_values(stmt) {
        return Some("insert with literal values");
    }
    let kind = classify(stmt);
    if config.drop_command_statements && kind == StatementKind::Command {
        return Some("command statement");
    }
    if !kind.is_retained() {
        return Some("statement kind not retained");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redacting() -> RedactionConfig {
        RedactionConfig {
            redact_literals: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_inactive_config_passes_through_unparsed() {
        let sql = "this is not sql at all";
        assert_eq!(
            process_query(sql, &DataPlatform::Snowflake, &RedactionConfig::default(), None),
            Some(sql.to_string())
        );
    }

    #[test]
    fn test_known_unparsable_passes_through() {
        let sql = "LIST @my_stage";
        assert_eq!(
            process_query(sql, &DataPlatform::Snowflake, &RedactionConfig::strict(), None),
            Some(sql.to_string())
        );
    }

    #[test]
    fn test_unparsable_respects_skip_flag() {
        let sql = "SELEKT 1";
        assert_eq!(
            process_query(sql, &DataPlatform::Postgres, &redacting(), None),
            Some(sql.to_string())
        );
        let skipping = RedactionConfig {
            skip_unparsable: true,
            ..redacting()
        };
        assert_eq!(
            process_query(sql, &DataPlatform::Postgres, &skipping, None),
            None
        );
    }

    #[test]
    fn test_empty_input_is_unparsable() {
        let skipping = RedactionConfig {
            skip_unparsable: true,
            ..Default::default()
        };
        assert_eq!(
            process_query("  ;  ", &DataPlatform::Postgres, &skipping, None),
            None
        );
    }

    #[test]
    fn test_drop_insert_values() {
        let config = RedactionConfig {
            drop_insert_values: true,
            ..Default::default()
        };
        assert_eq!(
            process_query(
                "INSERT INTO t (a, b) VALUES (1, 'x')",
                &DataPlatform::Postgres,
                &config,
                Some("q-1")
            ),
            None
        );
        assert_eq!(
            process_query(
                "INSERT INTO t SELECT a, b FROM s",
                &DataPlatform::Postgres,
                &config,
                None
            ),
            Some("INSERT INTO t SELECT a, b FROM s".to_string())
        );
    }

    #[test]
    fn test_commands_are_dropped() {
        let config = RedactionConfig {
            drop_command_statements: true,
            ..Default::default()
        };
        assert_eq!(
            process_query("GRANT SELECT ON t TO analyst", &DataPlatform::Postgres, &config, None),
            None
        );
    }

    #[test]
    fn test_any_dropped_statement_drops_whole_input() {
        assert_eq!(
            process_query(
                "SELECT * FROM t WHERE a = 1; COMMIT",
                &DataPlatform::Postgres,
                &redacting(),
                None
            ),
            None
        );
    }

    #[test]
    fn test_multi_statement_rejoined() {
        assert_eq!(
            process_query(
                "DELETE FROM t WHERE a = 1; UPDATE t SET b = 2 WHERE c = 'x'",
                &DataPlatform::Postgres,
                &redacting(),
                None
            ),
            Some("DELETE FROM t WHERE a = '?';\nUPDATE t SET b = 2 WHERE c = '?'".to_string())
        );
    }
}
