//! Error types for SQL parsing and lineage extraction.
//!
//! Two layers exist:
//!
//! - [`ParseError`]: the parser rejected the text. Carries the position and
//!   dialect so a failure can be traced back to a specific query.
//! - [`LineageError`]: anything that stops lineage extraction for a statement,
//!   parse failures included.
//!
//! Neither type escapes [`crate::extract_table_level_lineage`] or
//! [`crate::process_query`]: those entry points degrade to an empty result or
//! pass the text through, and log the error instead.

use crate::types::Dialect;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;
#[cfg(feature = "tracing")]
use tracing::trace;

/// Error encountered during SQL parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    /// Line/column reported by the parser, if it reported one.
    pub position: Option<Position>,
    pub dialect: Option<Dialect>,
    pub kind: ParseErrorKind,
}

/// 1-indexed location of a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Category of parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseErrorKind {
    #[default]
    SyntaxError,
    MissingClause,
    UnexpectedEof,
    UnsupportedFeature,
    LexerError,
    /// The statement nests deeper than the parser's recursion limit.
    RecursionLimit,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
            dialect: None,
            kind: ParseErrorKind::SyntaxError,
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    pub fn with_kind(mut self, kind: ParseErrorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_recursion_limit(&self) -> bool {
        self.kind == ParseErrorKind::RecursionLimit
    }

    /// Extracts `Line: X, Column: Y` from a sqlparser message.
    fn position_from_message(message: &str) -> Option<Position> {
        static POSITION_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
        let re = POSITION_REGEX
            .get_or_init(|| Regex::new(r"Line:\s*(\d+)\s*,\s*Column:\s*(\d+)").ok())
            .as_ref()?;

        let result = re.captures(message).and_then(|caps| {
            let line: usize = caps.get(1)?.as_str().parse().ok()?;
            let column: usize = caps.get(2)?.as_str().parse().ok()?;
            Some(Position { line, column })
        });

        #[cfg(feature = "tracing")]
        if result.is_none() && message.contains("Line") {
            trace!("no position found in parser message: {}", message);
        }

        result
    }

    fn kind_from_message(message: &str) -> ParseErrorKind {
        let lower = message.to_lowercase();
        if lower.contains("recursion limit") {
            ParseErrorKind::RecursionLimit
        } else if lower.contains("unexpected end") || lower.contains("eof") {
            ParseErrorKind::UnexpectedEof
        } else if lower.contains("expected") {
            ParseErrorKind::MissingClause
        } else if lower.contains("not supported") || lower.contains("unsupported") {
            ParseErrorKind::UnsupportedFeature
        } else if lower.contains("lexer") || lower.contains("token") {
            ParseErrorKind::LexerError
        } else {
            ParseErrorKind::SyntaxError
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parse error")?;

        if let Some(dialect) = self.dialect {
            write!(f, " ({dialect:?})")?;
        }

        if let Some(pos) = self.position {
            write!(f, " at line {}, column {}", pos.line, pos.column)?;
        }

        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<sqlparser::parser::ParserError> for ParseError {
    fn from(err: sqlparser::parser::ParserError) -> Self {
        use sqlparser::parser::ParserError;

        let message = err.to_string();
        let kind = match err {
            ParserError::RecursionLimitExceeded => ParseErrorKind::RecursionLimit,
            ParserError::TokenizerError(_) => ParseErrorKind::LexerError,
            ParserError::ParserError(_) => Self::kind_from_message(&message),
        };

        Self {
            position: Self::position_from_message(&message),
            message,
            dialect: None,
            kind,
        }
    }
}

/// Failure to extract lineage from a statement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineageError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The scope walk nested deeper than the resolver allows.
    #[error("max recursion depth of {depth} exceeded while resolving sources")]
    RecursionLimitExceeded { depth: usize },

    #[error("statement references no table: {0}")]
    MissingTableReference(String),

    /// The parsing layer panicked; the payload message is kept.
    #[error("internal failure during analysis: {0}")]
    Panicked(String),

    /// No thread with a large enough stack could be started.
    #[error("could not start analysis thread: {0}")]
    WorkerUnavailable(String),
}

impl LineageError {
    /// True for either recursion guard: the parser's or the resolver's.
    pub fn is_recursion_limit(&self) -> bool {
        match self {
            Self::RecursionLimitExceeded { .. } => true,
            Self::Parse(err) => err.is_recursion_limit(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlparser::parser::ParserError;

    #[test]
    fn test_position_from_message() {
        let msg = "Expected: an expression, found: EOF at Line: 1, Column: 15";
        assert_eq!(
            ParseError::position_from_message(msg),
            Some(Position {
                line: 1,
                column: 15
            })
        );
    }

    #[test]
    fn test_position_tolerates_missing_whitespace() {
        let msg = "Error at Line:3,Column:7";
        assert_eq!(
            ParseError::position_from_message(msg),
            Some(Position { line: 3, column: 7 })
        );
    }

    #[test]
    fn test_position_absent() {
        assert_eq!(ParseError::position_from_message("Unexpected token"), None);
        assert_eq!(
            ParseError::position_from_message("Error at Line: abc, Column: 5"),
            None
        );
    }

    #[test]
    fn test_kind_inference() {
        assert_eq!(
            ParseError::kind_from_message("Unexpected end of input"),
            ParseErrorKind::UnexpectedEof
        );
        assert_eq!(
            ParseError::kind_from_message("Expected: SELECT, found: FOO"),
            ParseErrorKind::MissingClause
        );
        assert_eq!(
            ParseError::kind_from_message("LATERAL is not supported here"),
            ParseErrorKind::UnsupportedFeature
        );
        assert_eq!(
            ParseError::kind_from_message("something odd"),
            ParseErrorKind::SyntaxError
        );
    }

    #[test]
    fn test_from_recursion_limit() {
        let err = ParseError::from(ParserError::RecursionLimitExceeded);
        assert!(err.is_recursion_limit());
        assert!(LineageError::from(err).is_recursion_limit());
    }

    #[test]
    fn test_from_tokenizer_error() {
        let err = ParseError::from(ParserError::TokenizerError(
            "Unterminated string literal at Line: 2, Column: 4".to_string(),
        ));
        assert_eq!(err.kind, ParseErrorKind::LexerError);
        assert_eq!(err.position, Some(Position { line: 2, column: 4 }));
    }

    #[test]
    fn test_display_includes_dialect_and_position() {
        let err = ParseError::from(ParserError::ParserError(
            "Expected: an expression, found: EOF at Line: 1, Column: 9".to_string(),
        ))
        .with_dialect(Dialect::Snowflake);
        let display = err.to_string();
        assert!(display.starts_with("Parse error (Snowflake) at line 1, column 9: "));
    }

    #[test]
    fn test_lineage_error_display() {
        let err = LineageError::RecursionLimitExceeded { depth: 256 };
        assert_eq!(
            err.to_string(),
            "max recursion depth of 256 exceeded while resolving sources"
        );
        assert!(err.is_recursion_limit());
        assert!(!LineageError::Panicked("boom".into()).is_recursion_limit());
    }
}
