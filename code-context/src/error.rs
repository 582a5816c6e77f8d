//! Error types for context extraction.
//!
//! These never reach callers of [`crate::ContextBuilder::extract`]; they
//! select the fallback path internally.

use thiserror::Error;

/// Result type alias for context extraction.
pub type Result<T> = std::result::Result<T, CodeContextError>;

/// Errors raised inside context extraction.
#[derive(Error, Debug)]
pub enum CodeContextError {
    /// No grammar exists for the language id.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The grammar could not be loaded or the source did not parse cleanly.
    #[error("parse error: {0}")]
    Parse(String),

    /// A symbol query failed to compile.
    #[error("query error: {0}")]
    Query(String),

    /// A selection resolved to an invalid byte range.
    #[error("invalid range: {start}..{end}")]
    InvalidRange { start: usize, end: usize },
}
