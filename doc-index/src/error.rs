//! Error types for documentation indexing.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for doc-index operations.
pub type Result<T> = std::result::Result<T, DocIndexError>;

/// Errors that can occur while reading and chunking documentation.
#[derive(Error, Debug)]
pub enum DocIndexError {
    /// The path does not exist.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The path exists but is a directory or other non-file entry.
    #[error("not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    /// The file is not markdown.
    #[error("unsupported file type: {}. Only .md files are supported", .0.display())]
    UnsupportedFileType(PathBuf),

    /// The path cannot be expressed relative to the workspace.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
