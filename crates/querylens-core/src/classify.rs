//! Coarse statement classification.
//!
//! The redaction transform keeps only statements that carry data movement or
//! schema changes; everything administrative is dropped. Lineage reports the
//! kinds for diagnostics.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlparser::ast::{SetExpr, Statement};

/// Bucket a parsed statement falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Query,
    /// INSERT, UPDATE, DELETE and COPY.
    Dml,
    Merge,
    /// CREATE, DROP, TRUNCATE and RENAME.
    Ddl,
    Alter,
    /// Session, transaction, privilege and introspection commands.
    Command,
    Other,
}

impl StatementKind {
    /// Kinds the redaction transform re-emits.
    pub fn is_retained(self) -> bool {
        matches!(
            self,
            Self::Query | Self::Dml | Self::Merge | Self::Ddl | Self::Alter
        )
    }
}

pub fn classify(stmt: &Statement) -> StatementKind {
    match stmt {
        Statement::Query(_) => StatementKind::Query,
        Statement::Insert(_)
        | Statement::Update { .. }
        | Statement::Delete { .. }
        | Statement::Copy { .. }
        | Statement::CopyIntoSnowflake { .. } => StatementKind::Dml,
        Statement::Merge { .. } => StatementKind::Merge,
        Statement::CreateTable(_)
        | Statement::CreateView { .. }
        | Statement::CreateIndex { .. }
        | Statement::CreateFunction { .. }
        | Statement::CreateProcedure { .. }
        | Statement::CreateTrigger { .. }
        | Statement::CreateSchema { .. }
        | Statement::CreateDatabase { .. }
        | Statement::Drop { .. }
        | Statement::Truncate { .. } => StatementKind::Ddl,
        Statement::AlterTable { .. }
        | Statement::AlterView { .. }
        | Statement::AlterIndex { .. }
        | Statement::AlterPolicy { .. } => StatementKind::Alter,
        Statement::Use { .. }
        | Statement::Grant { .. }
        | Statement::Revoke { .. }
        | Statement::Call { .. }
        | Statement::Execute { .. }
        | Statement::Kill { .. }
        | Statement::Commit { .. }
        | Statement::Rollback { .. }
        | Statement::StartTransaction { .. }
        | Statement::Explain { .. }
        | Statement::ExplainTable { .. }
        | Statement::Comment { .. }
        | Statement::ShowVariable { .. }
        | Statement::ShowTables { .. }
        | Statement::ShowColumns { .. }
        | Statement::ShowCreate { .. }
        | Statement::ShowFunctions { .. }
        | Statement::Savepoint { .. }
        | Statement::Prepare { .. }
        | Statement::Deallocate { .. } => StatementKind::Command,
        other => classify_by_keyword(other),
    }
}

/// Falls back to the leading keyword of the printed statement for the long
/// tail of variants not listed above.
fn classify_by_keyword(stmt: &Statement) -> StatementKind {
    let printed = stmt.to_string();
    let keyword = printed
        .split(|c: char| c.is_whitespace() || c == '(')
        .find(|word| !word.is_empty())
        .unwrap_or_default()
        .to_ascii_uppercase();

    match keyword.as_str() {
        "CREATE" | "DROP" | "RENAME" | "TRUNCATE" => StatementKind::Ddl,
        "ALTER" => StatementKind::Alter,
        "SHOW" | "SET" | "RESET" | "USE" | "GRANT" | "DENY" | "REVOKE" | "CALL" | "EXEC"
        | "EXECUTE" | "KILL" | "COMMIT" | "ROLLBACK" | "BEGIN" | "START" | "END" | "EXPLAIN"
        | "DESCRIBE" | "DESC" | "COMMENT" | "ANALYZE" | "VACUUM" | "LIST" | "REMOVE" | "PUT"
        | "GET" | "DECLARE" | "FETCH" | "CLOSE" | "OPEN" | "LISTEN" | "UNLISTEN" | "NOTIFY"
        | "DISCARD" | "FLUSH" | "PRAGMA" | "LOCK" | "UNLOCK" | "CACHE" | "UNCACHE"
        | "SAVEPOINT" | "RELEASE" | "DEALLOCATE" | "PREPARE" | "ATTACH" | "DETACH"
        | "INSTALL" | "LOAD" | "OPTIMIZE" | "MSCK" | "PRINT" | "RAISERROR" => {
            StatementKind::Command
        }
        _ => StatementKind::Other,
    }
}

/// True for an INSERT whose rows are literal `VALUES` (or `DEFAULT VALUES`)
/// rather than the result of a query.
pub fn is_insert_values(stmt: &Statement) -> bool {
    let Statement::Insert(insert) = stmt else {
        return false;
    };
    match &insert.source {
        None => true,
        Some(query) => matches!(query.body.as_ref(), SetExpr::Values(_)),
    }
}
