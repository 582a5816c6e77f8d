//! Configuration for the explanation engine.
//!
//! Read from TOML once at startup and validated before use. Every field has
//! a default, so an empty or missing file is a valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, RetrievalError};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocentConfig {
    /// Similarity search settings.
    pub retrieval: RetrievalSettings,

    /// Documentation sufficiency rules.
    pub enforcement: EnforcementConfig,

    /// Explanation cache settings.
    pub cache: CacheConfig,

    /// Indexing settings.
    pub index: IndexConfig,

    /// Embedding settings.
    pub embedding: EmbeddingConfig,
}

impl DocentConfig {
    /// Load configuration from a TOML file. A missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| RetrievalError::Config(format!("{}: {e}", path.display())))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| RetrievalError::Config(e.to_string()))
    }

    /// Set the retrieval settings.
    pub fn with_retrieval(mut self, retrieval: RetrievalSettings) -> Self {
        self.retrieval = retrieval;
        self
    }

    /// Set the enforcement rules.
    pub fn with_enforcement(mut self, enforcement: EnforcementConfig) -> Self {
        self.enforcement = enforcement;
        self
    }

    /// Set the cache settings.
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Set the index settings.
    pub fn with_index(mut self, index: IndexConfig) -> Self {
        self.index = index;
        self
    }

    /// Check every bounded field, naming the first one out of range.
    pub fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        check_range("retrieval.top_k", r.top_k, 1, 20)?;
        check_range("retrieval.similarity_threshold", r.similarity_threshold, 0.0, 1.0)?;
        check_range("retrieval.max_results", r.max_results, 1, 50)?;

        let e = &self.enforcement;
        check_range("enforcement.min_relevance", e.min_relevance, 0.0, 1.0)?;
        check_range("enforcement.min_grounding_ratio", e.min_grounding_ratio, 0.0, 1.0)?;

        let c = &self.cache;
        check_range("cache.ttl_secs", c.ttl_secs, 1, 604_800)?;
        check_range("cache.max_entries", c.max_entries, 1, usize::MAX)?;

        check_range("embedding.dimension", self.embedding.dimension, 8, 4096)?;

        if self.index.index_dir.as_os_str().is_empty() {
            return Err(RetrievalError::Config("index.index_dir must not be empty".to_string()));
        }
        Ok(())
    }

    /// Resolve the index directory against the workspace root.
    pub fn index_dir(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(&self.index.index_dir)
    }
}

fn check_range<T>(field: &str, value: T, min: T, max: T) -> Result<()>
where
    T: PartialOrd + Copy + std::fmt::Display,
{
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(RetrievalError::Config(format!(
            "{field} must be between {min} and {max}, got {value}"
        )))
    }
}

/// Similarity search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Chunks requested per query (1-20).
    pub top_k: usize,

    /// Minimum cosine similarity (0.0-1.0).
    pub similarity_threshold: f32,

    /// Hard cap on results (1-50).
    pub max_results: usize,

    /// When false every request is answered "Not documented.".
    pub enabled: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            similarity_threshold: 0.1,
            max_results: 10,
            enabled: true,
        }
    }
}

/// Documentation sufficiency rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnforcementConfig {
    /// A chunk qualifies only with relevance above this.
    pub min_relevance: f32,

    /// A qualifying chunk needs at least this many content characters.
    pub min_content_chars: usize,

    /// Share of explanation words that must appear in the retrieved docs.
    pub min_grounding_ratio: f32,

    /// Phrases marking a stub section, matched case-insensitively.
    pub placeholder_phrases: Vec<String>,
}

impl Default for EnforcementConfig {
    fn default() -> Self {
        Self {
            min_relevance: 0.15,
            min_content_chars: 20,
            min_grounding_ratio: 0.30,
            placeholder_phrases: [
                "todo",
                "tbd",
                "coming soon",
                "not implemented",
                "fixme",
                "placeholder",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Explanation cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether results are cached.
    pub enabled: bool,

    /// Entry lifetime in seconds (1-604800).
    pub ttl_secs: u64,

    /// Entries kept before the oldest is evicted.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 3600, // 1 hour
            max_entries: 1000,
        }
    }
}

/// Indexing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Index directory, relative to the workspace root.
    pub index_dir: PathBuf,

    /// Documentation directory, relative to the workspace root.
    pub docs_dir: PathBuf,

    /// Whether the root `README.md` is indexed.
    pub include_readme: bool,

    /// Remove YAML frontmatter before chunking.
    pub strip_frontmatter: bool,

    /// Drop empty non-Introduction chunks before storage.
    pub drop_empty_chunks: bool,

    /// Treat `#` lines inside fenced code blocks as content.
    pub respect_code_fences: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from(".docent"),
            docs_dir: PathBuf::from("docs"),
            include_readme: true,
            strip_frontmatter: true,
            drop_empty_chunks: false,
            respect_code_fences: false,
        }
    }
}

/// Embedding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Vector dimension (8-4096).
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimension: docent_embeddings::DEFAULT_DIMENSION,
        }
    }
}
