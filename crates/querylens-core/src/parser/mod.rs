use crate::error::ParseError;
use crate::types::Dialect;
use sqlparser::ast::Statement;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::{Parser, ParserError};

/// Nesting depth past which the parser gives up with a recursion-limit error.
///
/// Query logs contain machine-generated SQL with thousands of nested
/// parentheses; the bound keeps parsing from overflowing the stack.
pub const PARSER_RECURSION_LIMIT: usize = 64;

/// Parses `sql` with the grammar of `dialect` under the recursion bound.
pub fn parse_sql_with_dialect(sql: &str, dialect: Dialect) -> Result<Vec<Statement>, ParseError> {
    let sqlparser_dialect = dialect.to_sqlparser_dialect();
    match parse_bounded(sqlparser_dialect.as_ref(), sql) {
        Ok(statements) => Ok(statements),
        Err(primary_err) => {
            // Generic stumbles over Postgres operators (`::`, `->>`, `?`)
            // that show up in queries from unmapped platforms.
            if matches!(dialect, Dialect::Generic)
                && !matches!(primary_err, ParserError::RecursionLimitExceeded)
                && looks_like_postgres_syntax(sql)
            {
                if let Ok(statements) = parse_bounded(&PostgreSqlDialect {}, sql) {
                    return Ok(statements);
                }
            }
            Err(ParseError::from(primary_err).with_dialect(dialect))
        }
    }
}

fn parse_bounded(
    dialect: &dyn sqlparser::dialect::Dialect,
    sql: &str,
) -> Result<Vec<Statement>, ParserError> {
    Parser::new(dialect)
        .with_recursion_limit(PARSER_RECURSION_LIMIT)
        .try_with_sql(sql)?
        .parse_statements()
}

fn looks_like_postgres_syntax(sql: &str) -> bool {
    sql.contains("::")
        || sql.contains("->")
        || sql.contains("?|")
        || sql.contains("?&")
        || sql.contains(" ? ")
        || sql.contains("? '")
}
