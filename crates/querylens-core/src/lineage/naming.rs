use sqlparser::ast::{ObjectName, ObjectNamePart};

use crate::types::Table;

fn part_value(part: &ObjectNamePart) -> String {
    part.as_ident()
        .map(|ident| ident.value.clone())
        .unwrap_or_else(|| part.to_string())
}

/// Builds a [`Table`] from the written parts of an object name.
///
/// `t` → name, `s.t` → schema.name, `d.s.t` → database.schema.name. Longer
/// names (SQL Server's `server.db.schema.table`) keep the last three parts.
/// Stage references (`@stage`) and empty names are not tables.
pub fn table_from_object_name(name: &ObjectName) -> Option<Table> {
    let parts: Vec<String> = name.0.iter().map(part_value).collect();
    let (qualifiers, last) = match parts.split_last() {
        Some((last, qualifiers)) if !last.is_empty() => (qualifiers, last),
        _ => return None,
    };
    if parts.first().is_some_and(|first| first.starts_with('@')) {
        return None;
    }

    let mut table = Table::new(last.clone());
    let non_empty = |s: &String| (!s.is_empty()).then(|| s.clone());
    match qualifiers {
        [] => {}
        [schema] => table.schema = non_empty(schema),
        [.., database, schema] => {
            table.database = non_empty(database);
            table.schema = non_empty(schema);
        }
    }
    Some(table)
}

/// Lower-cased name when `name` is unqualified and could refer to a CTE.
pub fn cte_lookup_key(name: &ObjectName) -> Option<String> {
    match name.0.as_slice() {
        [only] => Some(part_value(only).to_lowercase()),
        _ => None,
    }
}
