//! Error types for the explanation engine.

use thiserror::Error;

use docent_doc_index::DocIndexError;
use docent_embeddings::EmbeddingError;
use docent_vector_store::VectorStoreError;

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors that can occur in the explanation engine.
///
/// Only [`RetrievalError::InvalidInput`] escapes `explain_code`; every other
/// variant is turned into a fallback result.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// The request was malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Vector store error.
    #[error("store error: {0}")]
    Store(#[from] VectorStoreError),

    /// Embedding error.
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Documentation file error.
    #[error("documentation error: {0}")]
    DocIndex(#[from] DocIndexError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
