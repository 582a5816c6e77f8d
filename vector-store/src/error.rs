//! Error types for the vector store.

use std::path::PathBuf;

use thiserror::Error;

use docent_embeddings::EmbeddingError;

/// Result type alias for vector store operations.
pub type Result<T> = std::result::Result<T, VectorStoreError>;

/// Errors that can occur in the vector store.
#[derive(Error, Debug)]
pub enum VectorStoreError {
    /// An operation ran before `initialize()`.
    #[error("vector store not initialized; call initialize() first")]
    NotInitialized,

    /// An operation ran after `close()`.
    #[error("vector store is closed")]
    Closed,

    /// A non-empty batch produced no storable chunk.
    #[error("no chunks could be stored ({failed} failed)")]
    NothingStored { failed: usize },

    /// Reading or writing the persisted index failed.
    #[error("index io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Embedding generation error.
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
