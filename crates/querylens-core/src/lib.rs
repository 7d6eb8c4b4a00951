pub mod classify;
pub mod error;
pub mod filter;
pub mod lineage;
pub mod parser;
pub mod preprocess;
pub mod redact;
pub mod types;
pub mod worker;

// Re-export the two entry points and their supporting functions
pub use classify::{classify, is_insert_values, StatementKind};
pub use error::{LineageError, ParseError, ParseErrorKind};
pub use filter::{is_known_unparsable, matching_signature};
pub use lineage::{
    analyze_table_level_lineage, extract_table_level_lineage, find_sources, find_targets,
    match_special_create, match_special_create_text, to_read_fragment, ReadFragment,
    SpecialCreate, MAX_RESOLUTION_DEPTH,
};
pub use parser::{parse_sql_with_dialect, PARSER_RECURSION_LIMIT};
pub use preprocess::preprocess;
pub use redact::process_query;
pub use worker::ANALYSIS_STACK_SIZE;

pub use types::{
    dialect_for,
    // Request types
    DataPlatform,
    Dialect,
    LineageRequest,
    RedactionConfig,
    ALLOWED_STATEMENT_TYPE_HINTS,
    // Response types
    LineageReport,
    LineageResult,
    QueriedDataset,
    Table,
    DEFAULT_ENV,
};
