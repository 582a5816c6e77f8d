//! # Vector Store
//!
//! Persists documentation chunks with their embeddings and answers top-k
//! cosine-similarity queries.
//!
//! ## Features
//!
//! - **Single Initialization**: Concurrent `initialize()` calls share one load
//! - **Best-Effort Writes**: One bad chunk never aborts a batch
//! - **Atomic Persistence**: JSON index rewritten via temp file and rename
//! - **Tolerant Loading**: Malformed rows are skipped and reported
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Vector Store                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  store_chunks ──► EmbeddingProvider ──► rows ──► index.json     │
//! │                                          │                      │
//! │  search_similar ──► embed query ──► find_top_k ──► chunks       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod store;

pub use config::{DEFAULT_MAX_RESULTS, DEFAULT_SIMILARITY_THRESHOLD, INDEX_FILE_NAME, StoreConfig};
pub use error::{Result, VectorStoreError};
pub use store::{StoreHealth, StoreReport, VectorStore};
