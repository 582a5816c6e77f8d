//! Vector store configuration.

use std::path::{Path, PathBuf};

/// Name of the persisted index file inside the index directory.
pub const INDEX_FILE_NAME: &str = "index.json";

/// Default minimum cosine similarity for search results.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.1;

/// Default hard cap on search results.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Configuration for a [`crate::VectorStore`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the persisted index.
    pub index_dir: PathBuf,

    /// Results below this similarity are dropped.
    pub similarity_threshold: f32,

    /// Upper bound on results regardless of the requested `top_k`.
    pub max_results: usize,
}

impl StoreConfig {
    /// Create a configuration persisting under `index_dir`.
    pub fn new(index_dir: impl Into<PathBuf>) -> Self {
        Self {
            index_dir: index_dir.into(),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Set the similarity threshold.
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Set the maximum number of results.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Path of the persisted index file.
    pub fn index_path(&self) -> PathBuf {
        self.index_dir.join(INDEX_FILE_NAME)
    }

    /// Directory holding the persisted index.
    pub fn index_dir(&self) -> &Path {
        &self.index_dir
    }
}
