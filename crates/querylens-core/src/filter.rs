//! Known-unparsable statement shapes.
//!
//! Query history carries statements sqlparser has no grammar for (Snowflake
//! stage commands, Hive `DESCRIBE EXTENDED`). Trying to parse them only
//! produces noisy errors, so they are recognized up front and skipped.

use regex::{Regex, RegexBuilder};
use std::sync::OnceLock;

/// Signature name paired with its anchored pattern.
const SIGNATURES: &[(&str, &str)] = &[
    ("snowflake_stage_get", r"^\s*GET\s+@"),
    ("snowflake_stage_put", r"^\s*PUT\s+file://"),
    ("snowflake_stage_list", r"^\s*(LIST|LS)\s+@"),
    ("describe_extended", r"^\s*(DESCRIBE|DESC)\s+(TABLE\s+)?EXTENDED\b"),
];

fn compiled_signatures() -> &'static [(&'static str, Regex)] {
    static COMPILED: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        SIGNATURES
            .iter()
            .filter_map(|(name, pattern)| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .ok()
                    .map(|re| (*name, re))
            })
            .collect()
    })
}

/// Name of the first signature `sql` matches, if any.
pub fn matching_signature(sql: &str) -> Option<&'static str> {
    compiled_signatures()
        .iter()
        .find(|(_, re)| re.is_match(sql))
        .map(|(name, _)| *name)
}

/// True when `sql` is a shape the parser is known to reject.
pub fn is_known_unparsable(sql: &str) -> bool {
    matching_signature(sql).is_some()
}
