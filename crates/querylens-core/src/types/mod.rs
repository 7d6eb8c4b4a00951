//! Types for the table-level lineage and redaction API.
//!
//! Connectors hand the engine raw SQL plus a little platform context and get
//! back either a [`LineageResult`] or rewritten SQL text. Everything in this
//! module is plain data: it is built per call and dropped afterwards.

mod config;
mod dialect;
mod platform;
mod request;
mod response;
mod table;

pub use config::RedactionConfig;
pub use dialect::{dialect_for, Dialect};
pub use platform::DataPlatform;
pub use request::{LineageRequest, ALLOWED_STATEMENT_TYPE_HINTS};
pub use response::{LineageReport, LineageResult};
pub use table::{QueriedDataset, Table, DEFAULT_ENV};
