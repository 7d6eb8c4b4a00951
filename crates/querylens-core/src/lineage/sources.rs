//! Scope-aware discovery of the tables a statement reads.
//!
//! The walk runs over the statement's [`ReadFragment`]. Every `WITH` clause
//! opens a scope whose bindings map CTE names to the physical tables their
//! bodies read; an unqualified table reference matching a visible binding is
//! replaced by that set.

use std::collections::HashSet;
use std::ops::ControlFlow;

use sqlparser::ast::{
    Expr, GroupByExpr, JoinConstraint, JoinOperator, OrderByKind, Query, Select, SelectItem,
    SetExpr, Statement, TableFactor, TableWithJoins, Visit, Visitor,
};
#[cfg(feature = "tracing")]
use tracing::trace;

use super::naming::{cte_lookup_key, table_from_object_name};
use super::reduce::{to_read_fragment, ReadFragment};
use crate::error::LineageError;
use crate::types::Table;

/// Deepest nesting of queries, scopes and subqueries the resolver follows.
pub const MAX_RESOLUTION_DEPTH: usize = 256;

/// Tables read by `stmt`.
pub fn find_sources(stmt: &Statement) -> Result<HashSet<Table>, LineageError> {
    resolve_fragment(&to_read_fragment(stmt))
}

/// Tables read by an already-reduced fragment.
pub fn resolve_fragment(fragment: &ReadFragment<'_>) -> Result<HashSet<Table>, LineageError> {
    let mut tables = HashSet::new();
    SourceResolver::default().fragment(fragment, &CteScope::root(), &mut tables)?;
    Ok(tables)
}

/// CTE bindings visible at one point of the walk.
struct CteScope<'p> {
    bindings: Vec<(String, HashSet<Table>)>,
    parent: Option<&'p CteScope<'p>>,
}

impl<'p> CteScope<'p> {
    fn root() -> Self {
        Self {
            bindings: Vec::new(),
            parent: None,
        }
    }

    fn child(parent: &'p CteScope<'p>) -> Self {
        Self {
            bindings: Vec::new(),
            parent: Some(parent),
        }
    }

    /// Innermost binding wins; within a scope the later declaration wins.
    fn lookup(&self, key: &str) -> Option<&HashSet<Table>> {
        self.bindings
            .iter()
            .rev()
            .find(|(name, _)| name == key)
            .map(|(_, tables)| tables)
            .or_else(|| self.parent.and_then(|parent| parent.lookup(key)))
    }

    fn bind(&mut self, name: String, tables: HashSet<Table>) {
        self.bindings.push((name, tables));
    }
}

#[derive(Default)]
struct SourceResolver {
    depth: usize,
}

impl SourceResolver {
    fn descend<F>(&mut self, walk: F) -> Result<(), LineageError>
    where
        F: FnOnce(&mut Self) -> Result<(), LineageError>,
    {
        if self.depth >= MAX_RESOLUTION_DEPTH {
            #[cfg(feature = "tracing")]
            trace!(depth = self.depth, "source resolution hit max recursion");
            return Err(LineageError::RecursionLimitExceeded {
                depth: MAX_RESOLUTION_DEPTH,
            });
        }
        self.depth += 1;
        let result = walk(self);
        self.depth -= 1;
        result
    }

    fn fragment(
        &mut self,
        fragment: &ReadFragment<'_>,
        scope: &CteScope<'_>,
        out: &mut HashSet<Table>,
    ) -> Result<(), LineageError> {
        match fragment {
            ReadFragment::Query(query) => self.query(query, scope, out),
            // DELETE ... WHERE id IN (SELECT ...) still reads the subquery.
            ReadFragment::Opaque(stmt) => {
                for subquery in outermost_subqueries(*stmt) {
                    self.query(&subquery, scope, out)?;
                }
                Ok(())
            }
        }
    }

    fn query(
        &mut self,
        query: &Query,
        scope: &CteScope<'_>,
        out: &mut HashSet<Table>,
    ) -> Result<(), LineageError> {
        self.descend(|this| {
            let Some(with) = &query.with else {
                return this.query_body(query, scope, out);
            };

            let mut local = CteScope::child(scope);
            for cte in &with.cte_tables {
                let name = cte.alias.name.value.to_lowercase();
                if with.recursive {
                    // The recursive arm's self-reference reads nothing new.
                    local.bind(name.clone(), HashSet::new());
                }
                let mut body = HashSet::new();
                this.query(&cte.query, &local, &mut body)?;
                local.bind(name, body);
            }
            this.query_body(query, &local, out)
        })
    }

    fn query_body(
        &mut self,
        query: &Query,
        scope: &CteScope<'_>,
        out: &mut HashSet<Table>,
    ) -> Result<(), LineageError> {
        self.set_expr(&query.body, scope, out)?;
        if let Some(order_by) = &query.order_by {
            if let OrderByKind::Expressions(exprs) = &order_by.kind {
                for order_expr in exprs {
                    self.expr(&order_expr.expr, scope, out)?;
                }
            }
        }
        Ok(())
    }

    fn set_expr(
        &mut self,
        body: &SetExpr,
        scope: &CteScope<'_>,
        out: &mut HashSet<Table>,
    ) -> Result<(), LineageError> {
        self.descend(|this| match body {
            SetExpr::Select(select) => this.select(select, scope, out),
            SetExpr::Query(query) => this.query(query, scope, out),
            SetExpr::SetOperation { left, right, .. } => {
                this.set_expr(left, scope, out)?;
                this.set_expr(right, scope, out)
            }
            SetExpr::Values(values) => {
                for expr in values.rows.iter().flatten() {
                    this.expr(expr, scope, out)?;
                }
                Ok(())
            }
            SetExpr::Insert(stmt)
            | SetExpr::Update(stmt)
            | SetExpr::Delete(stmt)
            | SetExpr::Merge(stmt) => this.fragment(&to_read_fragment(stmt), scope, out),
            SetExpr::Table(table) => {
                if let Some(name) = &table.table_name {
                    let mut found = Table::new(name.clone());
                    found.schema = table.schema_name.clone();
                    add_reference(found, scope, out);
                }
                Ok(())
            }
        })
    }

    fn select(
        &mut self,
        select: &Select,
        scope: &CteScope<'_>,
        out: &mut HashSet<Table>,
    ) -> Result<(), LineageError> {
        for table_with_joins in &select.from {
            self.table_with_joins(table_with_joins, scope, out)?;
        }
        for item in &select.projection {
            if let SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } = item {
                self.expr(expr, scope, out)?;
            }
        }
        for expr in [&select.selection, &select.having, &select.qualify]
            .into_iter()
            .flatten()
        {
            self.expr(expr, scope, out)?;
        }
        if let GroupByExpr::Expressions(exprs, _) = &select.group_by {
            for expr in exprs {
                self.expr(expr, scope, out)?;
            }
        }
        Ok(())
    }

    fn table_with_joins(
        &mut self,
        table: &TableWithJoins,
        scope: &CteScope<'_>,
        out: &mut HashSet<Table>,
    ) -> Result<(), LineageError> {
        self.table_factor(&table.relation, scope, out)?;
        for join in &table.joins {
            self.table_factor(&join.relation, scope, out)?;
            if let Some(JoinConstraint::On(expr)) = join_constraint(&join.join_operator) {
                self.expr(expr, scope, out)?;
            }
        }
        Ok(())
    }

    fn table_factor(
        &mut self,
        factor: &TableFactor,
        scope: &CteScope<'_>,
        out: &mut HashSet<Table>,
    ) -> Result<(), LineageError> {
        self.descend(|this| match factor {
            // `args` marks a table-valued function call.
            TableFactor::Table { name, args, .. } => {
                if args.is_some() {
                    return Ok(());
                }
                if let Some(bound) = cte_lookup_key(name).and_then(|key| scope.lookup(&key)) {
                    out.extend(bound.iter().cloned());
                } else if let Some(table) = table_from_object_name(name) {
                    out.insert(table);
                }
                Ok(())
            }
            TableFactor::Derived { subquery, .. } => this.query(subquery, scope, out),
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => this.table_with_joins(table_with_joins, scope, out),
            TableFactor::Pivot { table, .. }
            | TableFactor::Unpivot { table, .. }
            | TableFactor::MatchRecognize { table, .. } => this.table_factor(table, scope, out),
            _ => Ok(()),
        })
    }

    fn expr(
        &mut self,
        expr: &Expr,
        scope: &CteScope<'_>,
        out: &mut HashSet<Table>,
    ) -> Result<(), LineageError> {
        for subquery in outermost_subqueries(expr) {
            self.query(&subquery, scope, out)?;
        }
        Ok(())
    }
}

/// Adds a `TABLE t` reference, honoring CTE bindings.
fn add_reference(table: Table, scope: &CteScope<'_>, out: &mut HashSet<Table>) {
    if table.schema.is_none() {
        if let Some(bound) = scope.lookup(&table.name.to_lowercase()) {
            out.extend(bound.iter().cloned());
            return;
        }
    }
    out.insert(table);
}

fn join_constraint(op: &JoinOperator) -> Option<&JoinConstraint> {
    match op {
        JoinOperator::Join(c)
        | JoinOperator::Inner(c)
        | JoinOperator::Left(c)
        | JoinOperator::LeftOuter(c)
        | JoinOperator::Right(c)
        | JoinOperator::RightOuter(c)
        | JoinOperator::FullOuter(c)
        | JoinOperator::CrossJoin(c)
        | JoinOperator::Semi(c)
        | JoinOperator::LeftSemi(c)
        | JoinOperator::RightSemi(c)
        | JoinOperator::Anti(c)
        | JoinOperator::LeftAnti(c)
        | JoinOperator::RightAnti(c)
        | JoinOperator::StraightJoin(c) => Some(c),
        JoinOperator::AsOf { constraint, .. } => Some(constraint),
        JoinOperator::CrossApply | JoinOperator::OuterApply => None,
    }
}

/// Collects the queries nested in a node without descending into them, so
/// each can be resolved in the scope it appears in.
#[derive(Default)]
struct SubqueryCollector {
    depth: usize,
    found: Vec<Query>,
}

impl Visitor for SubqueryCollector {
    type Break = ();

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<()> {
        if self.depth == 0 {
            self.found.push(query.clone());
        }
        self.depth += 1;
        ControlFlow::Continue(())
    }

    fn post_visit_query(&mut self, _query: &Query) -> ControlFlow<()> {
        self.depth = self.depth.saturating_sub(1);
        ControlFlow::Continue(())
    }
}

fn outermost_subqueries<V: Visit>(node: &V) -> Vec<Query> {
    let mut collector = SubqueryCollector::default();
    let _ = node.visit(&mut collector);
    collector.found
}
