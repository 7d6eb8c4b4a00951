//! Output formatting modules.

pub mod json;

pub use json::{format_json, LineageRecord, RedactionRecord};
