use std::ops::ControlFlow;
use std::sync::OnceLock;

use regex::Regex;
use sqlparser::ast::{
    visit_expressions_mut, Expr, MergeAction, MergeInsertKind, Query, SetExpr, Statement, Value,
    VisitMut, VisitorMut,
};

use crate::parser::parse_sql_with_dialect;
use crate::types::Dialect;

/// True when `text` is a bind-parameter token: `?`, `$1`, `:name` or `@name`.
pub fn is_bind_placeholder(text: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\?|\$\d+|:[A-Za-z_]\w*|@[A-Za-z_]\w*)$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(text))
}

/// The AST value a redacted literal is replaced with in `dialect`.
///
/// A bind token prints verbatim when `dialect` reads it back as a
/// placeholder. Anything else, including `?` under Postgres where it is an
/// operator, prints as a quoted string so the output still parses.
pub fn placeholder_value(placeholder: &str, dialect: Dialect) -> Value {
    if is_bind_placeholder(placeholder) && reparses_as_placeholder(placeholder, dialect) {
        Value::Placeholder(placeholder.to_string())
    } else {
        Value::SingleQuotedString(placeholder.to_string())
    }
}

fn reparses_as_placeholder(token: &str, dialect: Dialect) -> bool {
    let sql = format!("SELECT * FROM t WHERE a = {token}");
    let Ok(statements) = parse_sql_with_dialect(&sql, dialect) else {
        return false;
    };
    let [Statement::Query(query)] = statements.as_slice() else {
        return false;
    };
    let SetExpr::Select(select) = query.body.as_ref() else {
        return false;
    };
    let Some(Expr::BinaryOp { right, .. }) = &select.selection else {
        return false;
    };
    matches!(
        right.as_ref(),
        Expr::Value(literal) if literal.value == Value::Placeholder(token.to_string())
    )
}

fn is_redactable(value: &Value) -> bool {
    !matches!(
        value,
        Value::Null | Value::Boolean(_) | Value::Placeholder(_)
    )
}

/// Replaces every literal under `expr`, nested subqueries included.
fn redact_expr(expr: &mut Expr, replacement: &Value) {
    let _ = visit_expressions_mut(expr, |node| {
        if let Expr::Value(literal) = node {
            if is_redactable(&literal.value) {
                literal.value = replacement.clone();
            }
        }
        ControlFlow::<()>::Continue(())
    });
}

/// Replaces literals in every WHERE clause of `stmt` and in the VALUES rows
/// of MERGE insert actions with `replacement`.
pub fn redact_statement(stmt: &mut Statement, replacement: &Value) {
    let mut redactor = LiteralRedactor {
        replacement: replacement.clone(),
    };
    let _ = stmt.visit(&mut redactor);
}

struct LiteralRedactor {
    replacement: Value,
}

impl LiteralRedactor {
    fn redact_set_expr(&self, body: &mut SetExpr) {
        match body {
            SetExpr::Select(select) => {
                if let Some(selection) = select.selection.as_mut() {
                    redact_expr(selection, &self.replacement);
                }
            }
            SetExpr::SetOperation { left, right, .. } => {
                self.redact_set_expr(left);
                self.redact_set_expr(right);
            }
            _ => {}
        }
    }
}

impl VisitorMut for LiteralRedactor {
    type Break = ();

    fn post_visit_query(&mut self, query: &mut Query) -> ControlFlow<()> {
        self.redact_set_expr(&mut query.body);
        ControlFlow::Continue(())
    }

    fn post_visit_statement(&mut self, stmt: &mut Statement) -> ControlFlow<()> {
        match stmt {
            Statement::Update {
                selection: Some(selection),
                ..
            } => redact_expr(selection, &self.replacement),
            Statement::Delete(delete) => {
                if let Some(selection) = delete.selection.as_mut() {
                    redact_expr(selection, &self.replacement);
                }
            }
            Statement::Merge { clauses, .. } => {
                for clause in clauses.iter_mut() {
                    if let MergeAction::Insert(insert) = &mut clause.action {
                        if let MergeInsertKind::Values(values) = &mut insert.kind {
                            for expr in values.rows.iter_mut().flatten() {
                                redact_expr(expr, &self.replacement);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
        ControlFlow::Continue(())
    }
}
