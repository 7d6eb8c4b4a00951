//! querylens CLI - SQL lineage extraction and query redaction

use querylens_cli::cli;
use querylens_cli::config::load_redaction_config;
use querylens_cli::input::{self, QueryInput};
use querylens_cli::output::{format_json, LineageRecord, RedactionRecord};

use anyhow::{Context, Result};
use clap::Parser;
use querylens_core::{
    analyze_table_level_lineage, process_query, DataPlatform, LineageReport, LineageRequest,
    RedactionConfig,
};
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Args, Mode, SchemaKind};

/// At least one input could not be analyzed.
const EXIT_FAILURE: u8 = 1;
/// Bad input files, configuration or arguments.
const EXIT_CONFIG_ERROR: u8 = 66;

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "QUERYLENS_LOG";

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.quiet);

    match run(args) {
        Ok(has_failures) => {
            if has_failures {
                ExitCode::from(EXIT_FAILURE)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("querylens: error: {e:#}");
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

fn init_logging(quiet: bool) {
    let default_level = if quiet { "error" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .try_init();
}

/// Returns whether any input failed analysis.
fn run(args: Args) -> Result<bool> {
    if let Some(kind) = args.json_schema {
        write_output(&args.output, &format_schema(kind, args.compact)?)?;
        return Ok(false);
    }

    let redaction = match args.mode {
        Mode::Redact => Some(
            args.apply_redaction_flags(load_redaction_config(args.config.as_deref())?),
        ),
        Mode::Lineage => None,
    };

    let sources = input::read_input(&args.files)?;
    let queries = if args.jsonl {
        input::jsonl_queries(&sources)?
    } else {
        input::sql_queries(sources, &request_template(&args))
    };
    info!(count = queries.len(), mode = ?args.mode, "processing queries");

    let (output, has_failures) = match redaction {
        Some(config) => (run_redaction(&queries, &config, args.compact)?, false),
        None => run_lineage(&queries, args.compact)?,
    };
    write_output(&args.output, &output)?;

    Ok(has_failures)
}

fn request_template(args: &Args) -> LineageRequest {
    LineageRequest {
        account: args.account.clone(),
        statement_type_hint: args.statement_type.clone(),
        default_database: args.default_database.clone(),
        default_schema: args.default_schema.clone(),
        ..LineageRequest::new("", DataPlatform::from_name(&args.platform))
    }
}

fn run_lineage(queries: &[QueryInput], compact: bool) -> Result<(String, bool)> {
    let records: Vec<LineageRecord> = queries
        .iter()
        .map(|query| LineageRecord {
            source: query.name.clone(),
            report: analyze_table_level_lineage(&query.request),
        })
        .collect();

    let failed = records
        .iter()
        .filter(|record| record.report.failure.is_some())
        .count();
    if failed > 0 {
        info!(failed, total = records.len(), "some queries could not be analyzed");
    }

    Ok((format_json(&records, compact)?, failed > 0))
}

fn run_redaction(queries: &[QueryInput], config: &RedactionConfig, compact: bool) -> Result<String> {
    let records: Vec<RedactionRecord> = queries
        .iter()
        .map(|query| RedactionRecord {
            source: query.name.clone(),
            sql: process_query(
                &query.request.sql,
                &query.request.platform,
                config,
                query.request.query_id.as_deref(),
            ),
        })
        .collect();

    format_json(&records, compact)
}

fn format_schema(kind: SchemaKind, compact: bool) -> Result<String> {
    let schema = match kind {
        SchemaKind::Request => schemars::schema_for!(LineageRequest),
        SchemaKind::Report => schemars::schema_for!(LineageReport),
        SchemaKind::Config => schemars::schema_for!(RedactionConfig),
    };
    format_json(&schema, compact)
}

fn write_output(path: &Option<std::path::PathBuf>, content: &str) -> Result<()> {
    if let Some(path) = path {
        fs::write(path, content)
            .with_context(|| format!("Failed to write to {}", path.display()))?;
    } else {
        io::stdout()
            .write_all(content.as_bytes())
            .context("Failed to write to stdout")?;
        if !content.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}
