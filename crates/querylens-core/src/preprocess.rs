//! Platform-specific text fixups applied before parsing.
//!
//! Some platforms accept statement forms whose option lists sqlparser cannot
//! read. The table references are all that lineage needs, so the option lists
//! are cut away textually. Each rewrite leaves text it does not recognize
//! unchanged.

use regex::{Regex, RegexBuilder};
use std::sync::OnceLock;

use crate::types::DataPlatform;

/// Rewrites `sql` into a form the platform's grammar can parse. Total.
pub fn preprocess(sql: &str, platform: &DataPlatform) -> String {
    match platform {
        DataPlatform::Snowflake => strip_snowflake_copy_options(sql),
        DataPlatform::Redshift => truncate_redshift_copy(sql),
        _ => sql.to_string(),
    }
}

fn case_insensitive(pattern: &str) -> Option<Regex> {
    RegexBuilder::new(pattern).case_insensitive(true).build().ok()
}

fn snowflake_copy_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| case_insensitive(r"^\s*COPY\s+INTO\b"))
        .as_ref()
}

fn snowflake_option_list_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        case_insensitive(r"\b(FILE_FORMAT|COPY_OPTIONS|CREDENTIALS|ENCRYPTION)\s*=\s*\(")
    })
    .as_ref()
}

fn snowflake_integration_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| case_insensitive(r#"\bSTORAGE_INTEGRATION\s*=\s*("[^"]*"|[\w.$]+)"#))
        .as_ref()
}

fn redshift_copy_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| case_insensitive(r"^\s*COPY\s+[^;]*?\bFROM\s+'(?:[^']|'')*'"))
        .as_ref()
}

fn strip_snowflake_copy_options(sql: &str) -> String {
    let (Some(copy), Some(options), Some(integration)) = (
        snowflake_copy_regex(),
        snowflake_option_list_regex(),
        snowflake_integration_regex(),
    ) else {
        return sql.to_string();
    };
    if !copy.is_match(sql) {
        return sql.to_string();
    }

    let mut out = sql.to_string();
    let mut search_from = 0;
    while let Some((start, end)) = options
        .find_at(&out, search_from)
        .map(|found| (found.start(), found.end()))
    {
        // The match ends just past the opening parenthesis.
        match matching_paren(&out, end - 1) {
            Some(close) => {
                out.replace_range(start..=close, "");
                search_from = start;
            }
            None => return sql.to_string(),
        }
    }

    integration.replace_all(&out, "").into_owned()
}

/// Byte index of the `)` closing the `(` at `open`, skipping quoted text.
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (idx, ch) in text[open..].char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + idx);
                }
            }
            _ => {}
        }
    }
    None
}

fn truncate_redshift_copy(sql: &str) -> String {
    match redshift_copy_regex().and_then(|re| re.find(sql)) {
        Some(found) => sql[..found.end()].to_string(),
        None => sql.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snowflake_copy_loses_option_lists() {
        let sql = "COPY INTO analytics.raw.events FROM @events_stage \
                   FILE_FORMAT = (TYPE = 'CSV' FIELD_DELIMITER = ',' SKIP_HEADER = 1) \
                   CREDENTIALS = (AWS_KEY_ID = 'abc' AWS_SECRET_KEY = 'x(y)')";
        let cleaned = preprocess(sql, &DataPlatform::Snowflake);
        assert!(!cleaned.contains("FILE_FORMAT"));
        assert!(!cleaned.contains("CREDENTIALS"));
        assert!(cleaned.contains("COPY INTO analytics.raw.events FROM @events_stage"));
    }

    #[test]
    fn test_snowflake_copy_drops_storage_integration() {
        let sql = "COPY INTO t FROM 's3://bucket/path' STORAGE_INTEGRATION = my_int";
        let cleaned = preprocess(sql, &DataPlatform::Snowflake);
        assert_eq!(cleaned.trim_end(), "COPY INTO t FROM 's3://bucket/path'");
    }

    #[test]
    fn test_snowflake_unbalanced_options_left_alone() {
        let sql = "COPY INTO t FROM @s FILE_FORMAT = (TYPE = 'CSV'";
        assert_eq!(preprocess(sql, &DataPlatform::Snowflake), sql);
    }

    #[test]
    fn test_snowflake_non_copy_untouched() {
        let sql = "SELECT file_format FROM t WHERE FILE_FORMAT = ('x')";
        assert_eq!(preprocess(sql, &DataPlatform::Snowflake), sql);
    }

    #[test]
    fn test_redshift_copy_truncated_after_location() {
        let sql = "COPY sales (id, amount) FROM 's3://bucket/sales/' \
                   IAM_ROLE 'arn:aws:iam::123:role/x' FORMAT AS PARQUET";
        assert_eq!(
            preprocess(sql, &DataPlatform::Redshift),
            "COPY sales (id, amount) FROM 's3://bucket/sales/'"
        );
    }

    #[test]
    fn test_other_platforms_identity() {
        let sql = "COPY sales FROM 's3://bucket' IAM_ROLE 'x'";
        assert_eq!(preprocess(sql, &DataPlatform::Postgres), sql);
        assert_eq!(preprocess(sql, &DataPlatform::from_name("dremio")), sql);
    }
}
