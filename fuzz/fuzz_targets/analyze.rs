#![no_main]

use libfuzzer_sys::fuzz_target;
use querylens_core::{
    extract_table_level_lineage, process_query, DataPlatform, RedactionConfig,
};

const PLATFORMS: &[&str] = &["snowflake", "bigquery", "postgres", "redshift", "mysql", "generic"];

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    if let Ok(sql) = std::str::from_utf8(rest) {
        let platform = DataPlatform::from_name(PLATFORMS[selector as usize % PLATFORMS.len()]);

        let _ = extract_table_level_lineage(sql, &platform, None, None, None, None);
        let _ = process_query(sql, &platform, &RedactionConfig::strict(), None);
    }
});
