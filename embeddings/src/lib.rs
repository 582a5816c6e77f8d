//! # Embeddings
//!
//! This crate provides deterministic, offline text embeddings and vector
//! similarity for the docent documentation index.
//!
//! ## Features
//!
//! - **Hash Embeddings**: Token-hash vectors with no model download and no
//!   network access; identical text always yields an identical vector
//! - **Similarity Search**: Cosine similarity and top-k ranking
//! - **Tokenization**: Identifier-aware tokenizer shared with the
//!   enforcement layer's term-overlap scoring
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings System                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  tokenize ──► EmbeddingProvider ──► Embedding                   │
//! │                      │                  │                       │
//! │                      ▼                  ▼                       │
//! │            HashEmbeddingProvider   cosine_similarity / top-k    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod provider;
pub mod similarity;
pub mod tokenize;

pub use error::{EmbeddingError, Result};
pub use provider::{
    EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, HashEmbeddingProvider,
};
pub use similarity::{SimilarityResult, cosine_similarity, find_top_k};
pub use tokenize::{identifier_parts, tokenize};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Dimension of the hash embeddings produced by default.
pub const DEFAULT_DIMENSION: usize = 128;
