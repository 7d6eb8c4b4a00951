//! CLI argument parsing using clap.

use clap::{Parser, ValueEnum};
use querylens_core::RedactionConfig;
use std::path::PathBuf;

/// querylens - table-level SQL lineage and query redaction
#[derive(Parser, Debug)]
#[command(name = "querylens")]
#[command(about = "Extract table lineage from SQL or redact it for storage", long_about = None)]
#[command(version)]
pub struct Args {
    /// SQL files to process (reads from stdin if none provided)
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// What to do with each query
    #[arg(short, long, default_value = "lineage", value_enum)]
    pub mode: Mode,

    /// Platform the queries were captured from (snowflake, bigquery, ...)
    #[arg(short, long, default_value = "generic")]
    pub platform: String,

    /// Treat each input line as a JSON lineage request instead of raw SQL
    #[arg(long)]
    pub jsonl: bool,

    /// Platform instance prefixed onto dataset identifiers
    #[arg(long, value_name = "NAME")]
    pub account: Option<String>,

    /// Statement type reported by the platform (e.g. INSERT)
    #[arg(long, value_name = "TYPE")]
    pub statement_type: Option<String>,

    /// Database for table references that do not name one
    #[arg(long, value_name = "DB")]
    pub default_database: Option<String>,

    /// Schema for table references that do not name one
    #[arg(long, value_name = "SCHEMA")]
    pub default_schema: Option<String>,

    /// JSON file with redaction settings (flags below override it)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Replace WHERE-clause and MERGE insert literals
    #[arg(long)]
    pub redact_literals: bool,

    /// Replacement text for redacted literals
    #[arg(long, value_name = "TEXT")]
    pub placeholder: Option<String>,

    /// Drop INSERT ... VALUES statements
    #[arg(long)]
    pub drop_insert_values: bool,

    /// Drop administrative and session commands
    #[arg(long)]
    pub drop_commands: bool,

    /// Drop statements that fail to parse instead of passing them through
    #[arg(long)]
    pub skip_unparsable: bool,

    /// Print the JSON schema of a data type and exit
    #[arg(long, value_enum, value_name = "TYPE")]
    pub json_schema: Option<SchemaKind>,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Compact JSON output (no pretty-printing)
    #[arg(short, long)]
    pub compact: bool,

    /// Only log errors on stderr
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Report source and target tables
    Lineage,
    /// Rewrite or drop queries for storage
    Redact,
}

/// Types whose JSON schema can be printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaKind {
    Request,
    Report,
    Config,
}

impl Args {
    /// Applies the redaction flags on top of `base`. Flags only switch
    /// settings on; they never turn off something the file enabled.
    pub fn apply_redaction_flags(&self, mut base: RedactionConfig) -> RedactionConfig {
        base.redact_literals |= self.redact_literals;
        base.drop_insert_values |= self.drop_insert_values;
        base.drop_command_statements |= self.drop_commands;
        base.skip_unparsable |= self.skip_unparsable;
        if let Some(placeholder) = &self.placeholder {
            base.placeholder = placeholder.clone();
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["querylens"]);
        assert_eq!(args.mode, Mode::Lineage);
        assert_eq!(args.platform, "generic");
        assert!(args.files.is_empty());
        assert!(!args.jsonl);
    }

    #[test]
    fn test_redaction_flags_override_file_settings() {
        let args = Args::parse_from([
            "querylens",
            "--mode",
            "redact",
            "--redact-literals",
            "--placeholder",
            "$1",
        ]);
        let base = RedactionConfig {
            skip_unparsable: true,
            placeholder: "REDACTED".to_string(),
            ..Default::default()
        };
        let config = args.apply_redaction_flags(base);
        assert!(config.redact_literals);
        assert!(config.skip_unparsable);
        assert!(!config.drop_insert_values);
        assert_eq!(config.placeholder, "$1");
    }

    #[test]
    fn test_schema_kind_parses() {
        let args = Args::parse_from(["querylens", "--json-schema", "report"]);
        assert_eq!(args.json_schema, Some(SchemaKind::Report));
    }
}
