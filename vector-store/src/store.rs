//! The persisted chunk store.
//!
//! Chunks are held in memory keyed by ID and written to a single JSON array
//! on every mutation. Writes go to a temporary file first and are renamed
//! into place, so a crash never leaves a half-written index.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::{Mutex, OnceCell, RwLock};
use tracing::{debug, info, warn};

use docent_doc_index::DocumentationChunk;
use docent_embeddings::{EmbeddingProvider, EmbeddingRequest, find_top_k};

use crate::config::StoreConfig;
use crate::error::{Result, VectorStoreError};

/// Counts reported by [`VectorStore::store_chunks`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreReport {
    /// Chunks inserted or replaced.
    pub stored: usize,

    /// Chunks skipped because no usable embedding could be produced.
    pub failed: usize,
}

/// Health of the store as reported by [`VectorStore::health_check`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreHealth {
    /// Whether `initialize()` has completed.
    pub initialized: bool,

    /// Whether `close()` has been called.
    pub closed: bool,

    /// Number of stored chunks.
    pub chunk_count: usize,

    /// Human-readable problems; empty when healthy.
    pub issues: Vec<String>,
}

impl StoreHealth {
    /// Whether no issues were found.
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Documentation chunk store with cosine-similarity search.
pub struct VectorStore {
    config: StoreConfig,
    provider: Arc<dyn EmbeddingProvider>,
    rows: RwLock<BTreeMap<String, DocumentationChunk>>,
    ready: OnceCell<()>,
    write_lock: Mutex<()>,
    closed: AtomicBool,
    initialize_count: AtomicUsize,
    load_issues: RwLock<Vec<String>>,
}

impl VectorStore {
    /// Create a store. Nothing is read from disk until [`Self::initialize`].
    pub fn new(config: StoreConfig, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            config,
            provider,
            rows: RwLock::new(BTreeMap::new()),
            ready: OnceCell::new(),
            write_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
            initialize_count: AtomicUsize::new(0),
            load_issues: RwLock::new(Vec::new()),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Load the persisted index.
    ///
    /// Idempotent. Concurrent callers share a single load; a failed load is
    /// retried by the next caller.
    pub async fn initialize(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(VectorStoreError::Closed);
        }
        self.ready.get_or_try_init(|| self.load()).await?;
        Ok(())
    }

    /// How many times the underlying load has run.
    pub fn initialize_count(&self) -> usize {
        self.initialize_count.load(Ordering::SeqCst)
    }

    /// Whether `initialize()` has completed.
    pub fn is_initialized(&self) -> bool {
        self.ready.initialized()
    }

    async fn load(&self) -> Result<()> {
        self.initialize_count.fetch_add(1, Ordering::SeqCst);

        let dir = self.config.index_dir();
        fs::create_dir_all(dir)
            .await
            .map_err(io_error_at(dir))?;

        let path = self.config.index_path();
        if !fs::try_exists(&path).await.unwrap_or(false) {
            info!("No index at {}, starting empty", path.display());
            return Ok(());
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(io_error_at(&path))?;

        let mut issues = Vec::new();
        let values: Vec<serde_json::Value> = match serde_json::from_str(&content) {
            Ok(values) => values,
            Err(e) => {
                warn!("Index file {} is unreadable, starting empty: {e}", path.display());
                issues.push(format!("index file is corrupt: {e}"));
                Vec::new()
            }
        };

        let mut rows = self.rows.write().await;
        let mut skipped = 0;
        for value in values {
            match serde_json::from_value::<DocumentationChunk>(value) {
                Ok(chunk) => {
                    rows.insert(chunk.id.clone(), chunk);
                }
                Err(e) => {
                    warn!("Skipping malformed index row: {e}");
                    skipped += 1;
                }
            }
        }
        if skipped > 0 {
            issues.push(format!("{skipped} malformed rows skipped while loading"));
        }

        info!("Loaded {} chunks from {}", rows.len(), path.display());
        *self.load_issues.write().await = issues;
        Ok(())
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(VectorStoreError::Closed);
        }
        if !self.ready.initialized() {
            return Err(VectorStoreError::NotInitialized);
        }
        Ok(())
    }

    /// Insert or replace chunks by ID.
    ///
    /// Chunks without an embedding are embedded first. A chunk whose
    /// embedding fails is skipped and counted; the call fails only when a
    /// non-empty batch stores nothing.
    pub async fn store_chunks(&self, chunks: Vec<DocumentationChunk>) -> Result<StoreReport> {
        self.ensure_ready()?;
        let _guard = self.write_lock.lock().await;

        let mut report = StoreReport::default();
        if chunks.is_empty() {
            return Ok(report);
        }

        let dimension = self.provider.dimension();
        for mut chunk in chunks {
            if chunk.embedding.is_none() {
                let request = EmbeddingRequest::new(chunk.embedding_text());
                match self.provider.embed(request).await {
                    Ok(response) => chunk.embedding = Some(response.embedding),
                    Err(e) => {
                        warn!("Failed to embed chunk {}: {e}", chunk.id);
                        report.failed += 1;
                        continue;
                    }
                }
            }

            let actual = chunk.embedding.as_ref().map_or(0, Vec::len);
            if actual != dimension {
                warn!(
                    "Skipping chunk {}: embedding dimension {actual}, expected {dimension}",
                    chunk.id
                );
                report.failed += 1;
                continue;
            }

            self.rows.write().await.insert(chunk.id.clone(), chunk);
            report.stored += 1;
        }

        if report.stored == 0 {
            return Err(VectorStoreError::NothingStored {
                failed: report.failed,
            });
        }

        self.persist().await?;
        debug!("Stored {} chunks ({} failed)", report.stored, report.failed);
        Ok(report)
    }

    /// Remove every chunk belonging to `file_path`, returning how many went.
    pub async fn remove_file(&self, file_path: &str) -> Result<usize> {
        self.ensure_ready()?;
        let _guard = self.write_lock.lock().await;

        let removed = {
            let mut rows = self.rows.write().await;
            let before = rows.len();
            rows.retain(|_, chunk| chunk.file_path != file_path);
            before - rows.len()
        };

        if removed > 0 {
            self.persist().await?;
            debug!("Removed {removed} chunks for {file_path}");
        }
        Ok(removed)
    }

    /// Search returning each chunk with its similarity.
    ///
    /// Results have similarity `>= similarity_threshold`, are sorted by
    /// similarity descending and number at most `min(top_k, max_results)`.
    pub async fn search_scored(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<(DocumentationChunk, f32)>> {
        self.ensure_ready()?;

        let response = self.provider.embed(EmbeddingRequest::new(query)).await?;
        let limit = top_k.min(self.config.max_results);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let rows = self.rows.read().await;
        let candidates = rows.values().filter_map(|chunk| match &chunk.embedding {
            Some(embedding) => Some((chunk.id.as_str(), embedding.as_slice())),
            None => {
                debug!("Chunk {} has no embedding, skipping", chunk.id);
                None
            }
        });

        let matches = find_top_k(
            &response.embedding,
            candidates,
            limit,
            self.config.similarity_threshold,
        );

        let results: Vec<(DocumentationChunk, f32)> = matches
            .into_iter()
            .filter_map(|m| rows.get(&m.id).map(|chunk| (chunk.clone(), m.score)))
            .collect();

        debug!("Search returned {} of {} chunks", results.len(), rows.len());
        Ok(results)
    }

    /// Search for the chunks most similar to `query`, without scores.
    pub async fn search_similar(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<DocumentationChunk>> {
        Ok(self
            .search_scored(query, top_k)
            .await?
            .into_iter()
            .map(|(chunk, _)| chunk)
            .collect())
    }

    /// Get a chunk by ID.
    pub async fn get(&self, id: &str) -> Result<Option<DocumentationChunk>> {
        self.ensure_ready()?;
        Ok(self.rows.read().await.get(id).cloned())
    }

    /// IDs of every chunk not belonging to `file_path`.
    pub async fn ids_excluding_file(&self, file_path: &str) -> Result<Vec<String>> {
        self.ensure_ready()?;
        Ok(self
            .rows
            .read()
            .await
            .values()
            .filter(|chunk| chunk.file_path != file_path)
            .map(|chunk| chunk.id.clone())
            .collect())
    }

    /// IDs of every row belonging to one of `file_paths`.
    pub async fn ids_in_files(&self, file_paths: &HashSet<String>) -> Result<Vec<String>> {
        self.ensure_ready()?;
        Ok(self
            .rows
            .read()
            .await
            .values()
            .filter(|chunk| file_paths.contains(&chunk.file_path))
            .map(|chunk| chunk.id.clone())
            .collect())
    }

    /// Distinct file paths with at least one stored chunk, sorted.
    pub async fn file_paths(&self) -> Result<Vec<String>> {
        self.ensure_ready()?;
        let rows = self.rows.read().await;
        let paths: BTreeSet<&str> = rows.values().map(|chunk| chunk.file_path.as_str()).collect();
        Ok(paths.into_iter().map(String::from).collect())
    }

    /// Number of stored chunks.
    pub async fn len(&self) -> Result<usize> {
        self.ensure_ready()?;
        Ok(self.rows.read().await.len())
    }

    /// Whether the store holds no chunks.
    pub async fn is_empty(&self) -> Result<bool> {
        self.ensure_ready()?;
        Ok(self.rows.read().await.is_empty())
    }

    /// Remove every chunk and persist the empty index.
    pub async fn clear_index(&self) -> Result<()> {
        self.ensure_ready()?;
        let _guard = self.write_lock.lock().await;
        self.rows.write().await.clear();
        self.load_issues.write().await.clear();
        self.persist().await?;
        info!("Cleared vector index");
        Ok(())
    }

    /// Close the store. Every later operation fails with `Closed`.
    pub async fn close(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.rows.write().await.clear();
        debug!("Closed vector store");
        Ok(())
    }

    /// Report store health without failing.
    pub async fn health_check(&self) -> StoreHealth {
        let initialized = self.is_initialized();
        let closed = self.closed.load(Ordering::SeqCst);
        let chunk_count = self.rows.read().await.len();
        let mut issues = Vec::new();

        if closed {
            issues.push("vector store is closed".to_string());
        } else if !initialized {
            issues.push("vector store not initialized".to_string());
        } else {
            issues.extend(self.load_issues.read().await.iter().cloned());
            if !is_writable_dir(self.config.index_dir()).await {
                issues.push(format!(
                    "index directory {} is not writable",
                    self.config.index_dir().display()
                ));
            }
        }

        StoreHealth {
            initialized,
            closed,
            chunk_count,
            issues,
        }
    }

    async fn persist(&self) -> Result<()> {
        let content = {
            let rows = self.rows.read().await;
            let all: Vec<&DocumentationChunk> = rows.values().collect();
            serde_json::to_string(&all)?
        };

        let path = self.config.index_path();
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &content)
            .await
            .map_err(io_error_at(&temp_path))?;
        fs::rename(&temp_path, &path)
            .await
            .map_err(io_error_at(&path))?;

        debug!("Persisted index to {}", path.display());
        Ok(())
    }
}

fn io_error_at(path: &Path) -> impl FnOnce(std::io::Error) -> VectorStoreError {
    let path = path.to_path_buf();
    move |source| VectorStoreError::Io { path, source }
}

async fn is_writable_dir(dir: &Path) -> bool {
    match fs::metadata(dir).await {
        Ok(metadata) => metadata.is_dir() && !metadata.permissions().readonly(),
        Err(_) => false,
    }
}
