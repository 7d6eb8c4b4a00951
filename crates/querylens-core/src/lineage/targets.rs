//! Discovery of the tables a statement writes.

use std::collections::HashSet;
use std::ops::ControlFlow;
use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use sqlparser::ast::{
    CopySource, ObjectName, Query, SetExpr, Statement, TableFactor, TableObject, Visit, Visitor,
};
use sqlparser::parser::Parser;

use super::naming::table_from_object_name;
use crate::error::{LineageError, ParseError};
use crate::types::{Dialect, Table};

/// Tables written by `stmt`, nested statements and `SELECT ... INTO` included.
pub fn find_targets(stmt: &Statement) -> HashSet<Table> {
    let mut collector = TargetCollector::default();
    let _ = stmt.visit(&mut collector);
    collector.tables
}

#[derive(Default)]
struct TargetCollector {
    tables: HashSet<Table>,
}

impl Visitor for TargetCollector {
    type Break = ();

    fn pre_visit_statement(&mut self, stmt: &Statement) -> ControlFlow<()> {
        if let Some(table) = written_object(stmt).and_then(table_from_object_name) {
            self.tables.insert(table);
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<()> {
        collect_select_into(&query.body, &mut self.tables);
        ControlFlow::Continue(())
    }
}

/// The object a statement writes rows into, if it writes any.
///
/// CREATE FUNCTION/INDEX/... name schema objects, not tables. `COPY ... TO`
/// exports, and Snowflake `COPY INTO @stage` unloads to a stage, which the
/// naming layer rejects.
fn written_object(stmt: &Statement) -> Option<&ObjectName> {
    match stmt {
        Statement::CreateTable(create) => Some(&create.name),
        Statement::CreateView { name, .. } => Some(name),
        Statement::Insert(insert) => match &insert.table {
            TableObject::TableName(name) => Some(name),
            TableObject::TableFunction(_) => None,
        },
        Statement::Update { table, .. } => factor_name(&table.relation),
        Statement::Merge { table, .. } => factor_name(table),
        Statement::Copy {
            source: CopySource::Table { table_name, .. },
            to: false,
            ..
        } => Some(table_name),
        Statement::CopyIntoSnowflake { into, .. } => Some(into),
        _ => None,
    }
}

fn factor_name(factor: &TableFactor) -> Option<&ObjectName> {
    match factor {
        TableFactor::Table { name, .. } => Some(name),
        _ => None,
    }
}

/// `SELECT ... INTO t` on any arm of this query's set operations. Nested
/// queries are reached by the visitor on their own.
fn collect_select_into(body: &SetExpr, tables: &mut HashSet<Table>) {
    match body {
        SetExpr::Select(select) => {
            if let Some(table) = select
                .into
                .as_ref()
                .and_then(|into| table_from_object_name(&into.name))
            {
                tables.insert(table);
            }
        }
        SetExpr::SetOperation { left, right, .. } => {
            collect_select_into(left, tables);
            collect_select_into(right, tables);
        }
        _ => {}
    }
}

/// `CREATE TABLE t LIKE s` / `CREATE TABLE t CLONE s`: one target, one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialCreate {
    pub target: Table,
    pub source: Table,
}

/// Recognizes the LIKE/CLONE forms on a parsed statement.
///
/// CLONE is read from the AST. LIKE is located in the printed statement,
/// which has no comments and one canonical spelling for every dialect.
pub fn match_special_create(
    stmt: &Statement,
    dialect: Dialect,
) -> Result<Option<SpecialCreate>, LineageError> {
    let Statement::CreateTable(create) = stmt else {
        return Ok(None);
    };
    let Some(target) = table_from_object_name(&create.name) else {
        return Ok(None);
    };

    let source = if let Some(clone) = &create.clone {
        table_from_object_name(clone)
    } else if create.like.is_some() {
        let printed = stmt.to_string();
        match like_keyword_regex().and_then(|re| re.find(&printed)) {
            Some(keyword) => Some(parse_table_name(&printed[keyword.end()..], dialect)?),
            None => None,
        }
    } else {
        None
    };

    Ok(source.map(|source| SpecialCreate { target, source }))
}

/// Recognizes the LIKE/CLONE forms on raw text the parser rejected, such as
/// Snowflake's `CLONE s AT (TIMESTAMP => ...)`. Leading comments are skipped.
pub fn match_special_create_text(
    sql: &str,
    dialect: Dialect,
) -> Result<Option<SpecialCreate>, LineageError> {
    let sql = strip_leading_comments(sql);
    let Some(caps) = special_create_regex().and_then(|re| re.captures(sql)) else {
        return Ok(None);
    };
    let (Some(target), Some(source)) = (caps.name("target"), caps.name("source")) else {
        return Ok(None);
    };

    Ok(Some(SpecialCreate {
        target: parse_table_name(target.as_str(), dialect)?,
        source: parse_table_name(source.as_str(), dialect)?,
    }))
}

const IDENT: &str = r#"(?:"[^"]+"|`[^`]+`|\[[^\]]+\]|[\w$]+)"#;

fn special_create_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        let name = format!(r"{IDENT}(?:\s*\.\s*{IDENT})*");
        let pattern = format!(
            r"^CREATE\s+(?:OR\s+REPLACE\s+)?(?:(?:LOCAL|GLOBAL)\s+)?(?:TRANSIENT\s+|TEMPORARY\s+|TEMP\s+|VOLATILE\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(?P<target>{name})\s+(?:LIKE|CLONE)\s+(?P<source>{name})"
        );
        RegexBuilder::new(&pattern).case_insensitive(true).build().ok()
    })
    .as_ref()
}

fn like_keyword_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        RegexBuilder::new(r"[\s(]LIKE\s+")
            .case_insensitive(true)
            .build()
            .ok()
    })
    .as_ref()
}

/// `sql` without leading whitespace, `-- line` and `/* block */` comments.
fn strip_leading_comments(mut sql: &str) -> &str {
    loop {
        sql = sql.trim_start();
        if let Some(rest) = sql.strip_prefix("--") {
            sql = rest.find('\n').map_or("", |newline| &rest[newline + 1..]);
        } else if let Some(rest) = sql.strip_prefix("/*") {
            match rest.find("*/") {
                Some(close) => sql = &rest[close + 2..],
                None => return "",
            }
        } else {
            return sql;
        }
    }
}

fn parse_table_name(text: &str, dialect: Dialect) -> Result<Table, LineageError> {
    let sqlparser_dialect = dialect.to_sqlparser_dialect();
    let name = Parser::new(sqlparser_dialect.as_ref())
        .try_with_sql(text)
        .and_then(|mut parser| parser.parse_object_name(false))
        .map_err(|err| ParseError::from(err).with_dialect(dialect))?;
    table_from_object_name(&name).ok_or_else(|| LineageError::MissingTableReference(text.to_string()))
}
