//! Embedding errors.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmbeddingError>;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("invalid embedding dimension: {0}")]
    InvalidDimension(usize),

    /// Two vectors compared or stored together have different lengths.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding contains non-finite values")]
    NonFinite,

    /// Input exceeds the provider's character limit.
    #[error("text of {length} chars exceeds the {max_length} char limit")]
    TextTooLong { length: usize, max_length: usize },
}
