//! # Explanation Engine
//!
//! Explains code strictly from a workspace's own markdown documentation.
//! When the documentation does not support an answer the engine says
//! "Not documented." instead of guessing.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Explanation Engine                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  CodeContext ──► In-flight ──► Cache ──► Vector Store search    │
//! │                   dedup        lookup           │               │
//! │                                                 ▼               │
//! │                                  ┌──────────────────────────┐   │
//! │                                  │ Enforcement              │   │
//! │                                  │ relevance, content floor,│   │
//! │                                  │ placeholder stubs        │   │
//! │                                  └────────────┬─────────────┘   │
//! │                                  rejected     │  accepted       │
//! │                                      │        ▼                 │
//! │                                      │  ┌─────────────┐         │
//! │                                      │  │  Generator  │         │
//! │                                      │  │ + grounding │         │
//! │                                      │  └──────┬──────┘         │
//! │                                      ▼         ▼                │
//! │                                  ExplanationResult ──► Cache    │
//! └─────────────────────────────────────────────────────────────────┘
//!
//!  Workspace README.md + docs/**.md ──► WorkspaceIndexer ──► Vector Store
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docent_retrieval::{DocentConfig, ExplanationEngine, WorkspaceIndexer};
//!
//! let engine = ExplanationEngine::open(root, DocentConfig::default()).await?;
//! WorkspaceIndexer::new(engine.clone(), root).index_workspace().await?;
//!
//! let result = engine.explain_code(&context).await?;
//! println!("{}", result.explanation);
//! ```

pub mod cache;
pub mod config;
pub mod engine;
pub mod enforcement;
pub mod error;
pub mod generator;
pub mod hashing;
pub mod indexer;
pub mod inflight;
pub mod keywords;
pub mod result;

pub use cache::{CacheEntry, CacheStats, ExplanationCache};
pub use config::{
    CacheConfig, DocentConfig, EmbeddingConfig, EnforcementConfig, IndexConfig,
    RetrievalSettings,
};
pub use engine::{ExplanationEngine, HealthReport, HealthStatus};
pub use enforcement::{Enforcer, Rejection, ScoredChunk, Verdict};
pub use error::{Result, RetrievalError};
pub use generator::{Generator, grounding_ratio, split_sentences};
pub use hashing::{cache_key, context_hash};
pub use indexer::{IndexReport, WorkspaceIndexer};
pub use inflight::InFlightRegistry;
pub use result::{Citation, ExplanationResult, FailureKind, NO_SELECTION, NOT_DOCUMENTED};

// Re-export from dependencies for convenience
pub use docent_code_context::{
    CodeContext, ContextBuilder, Position, Selection, TextDocument, language_for_file,
};
pub use docent_doc_index::DocumentationChunk;
pub use docent_vector_store::VectorStore;
pub use tokio_util::sync::CancellationToken;
