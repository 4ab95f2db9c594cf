//! Error types for the xc-ts-parser crate.
//!
//! [`ParseError`] is a setup failure (the grammar or a query could not be
//! loaded) and aborts the caller. [`ParseFailure`] is the expected outcome of
//! a structured parse that did not produce a usable tree; callers answer it
//! by falling back to pattern extraction.

use serde::{Deserialize, Serialize};

/// Errors that can occur while setting up the parser.
///
/// # Examples
///
/// ```
/// use xc_ts_parser::ParseError;
///
/// let err = ParseError::LanguageInit;
/// assert_eq!(err.to_string(), "failed to set TypeScript language");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Failed to set the TypeScript or TSX language on the parser.
    #[error("failed to set TypeScript language")]
    LanguageInit,

    /// Failed to compile a tree-sitter query.
    #[error("failed to compile query at offset {offset}: {kind:?}")]
    QueryCompile {
        /// The byte offset in the query string where the error occurred.
        offset: usize,
        /// The kind of query error.
        kind: tree_sitter::QueryError,
    },

    /// Failed to compile a fallback pattern.
    #[error("failed to compile fallback pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Why a structured parse produced no usable tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum ParseFailure {
    /// Structured parsing is turned off in the configuration.
    #[error("structured parsing disabled")]
    Disabled,

    /// The parse exceeded its wall-clock budget.
    #[error("structured parse timed out")]
    Timeout,

    /// The source contains syntax the grammar could not recover from.
    #[error("source contains syntax errors")]
    Syntax,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_failure_display() {
        assert_eq!(ParseFailure::Timeout.to_string(), "structured parse timed out");
        assert_eq!(ParseFailure::Syntax.to_string(), "source contains syntax errors");
    }

    #[test]
    fn test_pattern_error_from_regex() {
        let err = regex::Regex::new("(").unwrap_err();
        assert!(matches!(ParseError::from(err), ParseError::Pattern(_)));
    }
}
