//! Reduction of write statements to the query that produces their input.
//!
//! Source discovery only has to understand queries: an `UPDATE` reads the
//! same tables as a `SELECT` over its FROM list, a `MERGE` reads its `USING`
//! relation, and so on. Reduction is purely structural; no names are
//! resolved here.

use std::borrow::Cow;
use std::sync::OnceLock;

use sqlparser::ast::{
    Assignment, AssignmentTarget, CopySource, Expr, Query, SelectItem, SetExpr, Statement,
    TableFactor, TableWithJoins, UpdateTableFromKind,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

/// The read side of a statement.
#[derive(Debug, Clone)]
pub enum ReadFragment<'a> {
    /// A query borrowed from the statement, or one synthesized from it.
    Query(Cow<'a, Query>),
    /// No reducible read side. Subqueries nested in the statement's
    /// expressions are still read.
    Opaque(&'a Statement),
}

impl ReadFragment<'_> {
    pub fn as_query(&self) -> Option<&Query> {
        match self {
            Self::Query(query) => Some(query.as_ref()),
            Self::Opaque(_) => None,
        }
    }
}

pub fn to_read_fragment(stmt: &Statement) -> ReadFragment<'_> {
    let fragment = match stmt {
        Statement::Merge { source, .. } => merge_source(source),
        Statement::Insert(insert) => match insert.source.as_deref() {
            Some(query) => match query.body.as_ref() {
                SetExpr::Values(values) => values_subqueries(&values.rows).map(Cow::Owned),
                _ => Some(Cow::Borrowed(query)),
            },
            None => None,
        },
        Statement::Update {
            table,
            assignments,
            from,
            selection,
            ..
        } => update_as_select(table, assignments, from.as_ref(), selection.as_ref())
            .map(Cow::Owned),
        Statement::CreateTable(create) => create.query.as_deref().map(Cow::Borrowed),
        Statement::CreateView { query, .. } => Some(Cow::Borrowed(query.as_ref())),
        Statement::Query(query) => Some(Cow::Borrowed(unwrap_parenthesized(query))),
        Statement::Copy {
            source: CopySource::Query(query),
            ..
        } => Some(Cow::Borrowed(query.as_ref())),
        _ => None,
    };

    match fragment {
        Some(query) => ReadFragment::Query(query),
        None => ReadFragment::Opaque(stmt),
    }
}

/// `SELECT * FROM querylens_skeleton`, parsed once and cloned for every
/// synthesized query.
fn select_skeleton() -> Option<&'static Query> {
    static SKELETON: OnceLock<Option<Query>> = OnceLock::new();
    SKELETON
        .get_or_init(|| {
            let statements =
                Parser::parse_sql(&GenericDialect {}, "SELECT * FROM querylens_skeleton").ok()?;
            match statements.into_iter().next()? {
                Statement::Query(query) => Some(*query),
                _ => None,
            }
        })
        .as_ref()
}

/// Builds `SELECT <projection> FROM <from> [WHERE <selection>]`.
///
/// `projection` of `None` keeps the skeleton's `*`. Several FROM items are
/// printed comma-separated, which reads the same tables as a join would.
fn synthesize_select(
    from: Vec<TableWithJoins>,
    projection: Option<Vec<SelectItem>>,
    selection: Option<Expr>,
) -> Option<Query> {
    let mut query = select_skeleton()?.clone();
    let SetExpr::Select(select) = query.body.as_mut() else {
        return None;
    };
    select.from = from;
    if let Some(projection) = projection {
        select.projection = projection;
    }
    select.selection = selection;
    Some(query)
}

fn relation_only(relation: TableFactor) -> TableWithJoins {
    TableWithJoins {
        relation,
        joins: vec![],
    }
}

fn merge_source(source: &TableFactor) -> Option<Cow<'_, Query>> {
    match source {
        TableFactor::Derived { subquery, .. } => Some(Cow::Borrowed(subquery.as_ref())),
        other => synthesize_select(vec![relation_only(other.clone())], None, None).map(Cow::Owned),
    }
}

/// `SELECT * FROM (<sq0>), (<sq1>), ...` over the subqueries embedded in
/// VALUES rows. `None` when the rows are all plain expressions.
fn values_subqueries(rows: &[Vec<Expr>]) -> Option<Query> {
    let from: Vec<TableWithJoins> = rows
        .iter()
        .flatten()
        .filter_map(|expr| match expr {
            Expr::Subquery(subquery) => Some(relation_only(TableFactor::Derived {
                lateral: false,
                subquery: subquery.clone(),
                alias: None,
            })),
            _ => None,
        })
        .collect();

    if from.is_empty() {
        return None;
    }
    synthesize_select(from, None, None)
}

/// `UPDATE t SET c = e FROM f WHERE w` becomes `SELECT e AS c FROM f, t WHERE w`.
///
/// Joins attached to the target (`UPDATE a JOIN b ...`) stay on its node.
fn update_as_select(
    table: &TableWithJoins,
    assignments: &[Assignment],
    from: Option<&UpdateTableFromKind>,
    selection: Option<&Expr>,
) -> Option<Query> {
    let projection: Vec<SelectItem> = assignments.iter().map(assignment_as_select_item).collect();

    let mut from_tables = match from {
        Some(UpdateTableFromKind::BeforeSet(tables) | UpdateTableFromKind::AfterSet(tables)) => {
            tables.clone()
        }
        None => Vec::new(),
    };
    from_tables.push(table.clone());

    synthesize_select(
        from_tables,
        (!projection.is_empty()).then_some(projection),
        selection.cloned(),
    )
}

fn assignment_as_select_item(assignment: &Assignment) -> SelectItem {
    let value = assignment.value.clone();
    match &assignment.target {
        AssignmentTarget::ColumnName(column) => {
            match column.0.last().and_then(|part| part.as_ident()) {
                Some(alias) => SelectItem::ExprWithAlias {
                    expr: value,
                    alias: alias.clone(),
                },
                None => SelectItem::UnnamedExpr(value),
            }
        }
        // (a, b) = (SELECT ...) has no single alias.
        AssignmentTarget::Tuple(_) => SelectItem::UnnamedExpr(value),
    }
}

fn unwrap_parenthesized(query: &Query) -> &Query {
    match query.body.as_ref() {
        SetExpr::Query(inner) if query.with.is_none() => inner,
        _ => query,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_sql_with_dialect;
    use crate::types::Dialect;

    fn reduced(sql: &str, dialect: Dialect) -> Option<String> {
        let statements = parse_sql_with_dialect(sql, dialect).unwrap();
        to_read_fragment(&statements[0])
            .as_query()
            .map(|query| query.to_string())
    }

    #[test]
    fn test_update_becomes_select() {
        assert_eq!(
            reduced(
                "UPDATE tab1 SET col1 = 'v' WHERE col2 = 'v2'",
                Dialect::Snowflake
            ),
            Some("SELECT 'v' AS col1 FROM tab1 WHERE col2 = 'v2'".to_string())
        );
    }

    #[test]
    fn test_update_from_lists_sources_before_target() {
        assert_eq!(
            reduced(
                "UPDATE t SET a = s.a FROM s WHERE t.id = s.id",
                Dialect::Postgres
            ),
            Some("SELECT s.a AS a FROM s, t WHERE t.id = s.id".to_string())
        );
    }

    #[test]
    fn test_merge_bare_source_is_wrapped() {
        assert_eq!(
            reduced(
                "MERGE INTO tgt USING src ON tgt.k = src.k WHEN MATCHED THEN DELETE",
                Dialect::Generic
            ),
            Some("SELECT * FROM src".to_string())
        );
    }

    #[test]
    fn test_merge_derived_source_taken_as_is() {
        assert_eq!(
            reduced(
                "MERGE INTO tgt USING (SELECT * FROM staging) AS s ON tgt.k = s.k \
                 WHEN MATCHED THEN DELETE",
                Dialect::Generic
            ),
            Some("SELECT * FROM staging".to_string())
        );
    }

    #[test]
    fn test_insert_values_with_subqueries() {
        assert_eq!(
            reduced(
                "INSERT INTO t VALUES ((SELECT max(id) FROM a), 1)",
                Dialect::Generic
            ),
            Some("SELECT * FROM (SELECT max(id) FROM a)".to_string())
        );
    }

    #[test]
    fn test_plain_insert_values_is_opaque() {
        assert_eq!(
            reduced("INSERT INTO t (a) VALUES (1), (2)", Dialect::Generic),
            None
        );
    }

    #[test]
    fn test_insert_select_borrows_query() {
        assert_eq!(
            reduced("INSERT INTO t SELECT * FROM s", Dialect::Generic),
            Some("SELECT * FROM s".to_string())
        );
    }

    #[test]
    fn test_create_without_query_is_opaque() {
        assert_eq!(reduced("CREATE TABLE t (a INT)", Dialect::Generic), None);
        assert_eq!(
            reduced("CREATE VIEW v AS SELECT a FROM t", Dialect::Generic),
            Some("SELECT a FROM t".to_string())
        );
    }

    #[test]
    fn test_parenthesized_query_unwrapped() {
        assert_eq!(
            reduced("(SELECT a FROM t)", Dialect::Generic),
            Some("SELECT a FROM t".to_string())
        );
    }
}
