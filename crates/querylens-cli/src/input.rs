//! Input handling for SQL files, JSON-lines query logs and stdin.

use anyhow::{Context, Result};
use querylens_core::LineageRequest;
use std::io::{self, Read};
use std::path::PathBuf;

/// A raw input document and the name it is reported under.
#[derive(Debug, Clone)]
pub struct InputSource {
    pub name: String,
    pub content: String,
}

/// One query to process, tagged with where it came from.
#[derive(Debug, Clone)]
pub struct QueryInput {
    pub name: String,
    pub request: LineageRequest,
}

/// Read input from files, or from stdin when no files are given.
pub fn read_input(files: &[PathBuf]) -> Result<Vec<InputSource>> {
    if files.is_empty() {
        read_from_stdin()
    } else {
        read_from_files(files)
    }
}

fn read_from_stdin() -> Result<Vec<InputSource>> {
    let mut content = String::new();
    io::stdin()
        .read_to_string(&mut content)
        .context("Failed to read from stdin")?;

    Ok(vec![InputSource {
        name: "<stdin>".to_string(),
        content,
    }])
}

fn read_from_files(files: &[PathBuf]) -> Result<Vec<InputSource>> {
    files
        .iter()
        .map(|path| {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read file: {}", path.display()))?;

            Ok(InputSource {
                name: path.display().to_string(),
                content,
            })
        })
        .collect()
}

/// Turns each source into a single query built from `template`.
pub fn sql_queries(sources: Vec<InputSource>, template: &LineageRequest) -> Vec<QueryInput> {
    sources
        .into_iter()
        .map(|source| QueryInput {
            name: source.name,
            request: LineageRequest {
                sql: source.content,
                ..template.clone()
            },
        })
        .collect()
}

/// Parses every non-blank line of every source as a [`LineageRequest`].
///
/// Entries are named `<source>:<line>`. A malformed line fails the whole run.
pub fn jsonl_queries(sources: &[InputSource]) -> Result<Vec<QueryInput>> {
    let mut queries = Vec::new();
    for source in sources {
        for (index, line) in source.content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let name = format!("{}:{}", source.name, index + 1);
            let request: LineageRequest = serde_json::from_str(line)
                .with_context(|| format!("Invalid lineage request at {name}"))?;
            queries.push(QueryInput { name, request });
        }
    }
    Ok(queries)
}
