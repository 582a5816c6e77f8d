//! In-memory explanation cache.
//!
//! Entries are keyed by [`cache_key`] and expire lazily: an expired entry is
//! dropped when it is next read or during [`ExplanationCache::cleanup_expired`].
//! There is no background timer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use docent_code_context::CodeContext;

use crate::config::CacheConfig;
use crate::hashing::cache_key;
use crate::result::ExplanationResult;

/// A cached explanation.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub result: ExplanationResult,

    /// When the entry was stored.
    pub timestamp: DateTime<Utc>,

    pub ttl: Duration,

    created: Instant,
}

impl CacheEntry {
    /// Whether the entry has outlived its TTL.
    pub fn is_expired(&self) -> bool {
        self.created.elapsed() >= self.ttl
    }

    /// Whether any citation points at `file_path`.
    pub fn cites(&self, file_path: &str) -> bool {
        self.result.citations.iter().any(|c| c.file_path == file_path)
    }
}

/// Cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub entries: usize,
    pub max_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub invalidations: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
    expired: u64,
    invalidations: u64,
}

/// Explanation cache shared by clones.
#[derive(Debug, Clone)]
pub struct ExplanationCache {
    state: Arc<Mutex<CacheState>>,
    max_entries: usize,
    default_ttl: Duration,
}

impl ExplanationCache {
    /// Create a cache holding at most `max_entries` (at least one).
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            max_entries: max_entries.max(1),
            default_ttl,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_entries, Duration::from_secs(config.ttl_secs))
    }

    /// Store a result for a context, replacing any previous entry.
    ///
    /// Evicts the oldest entry when full.
    pub async fn store(
        &self,
        context: &CodeContext,
        result: ExplanationResult,
        ttl: Option<Duration>,
    ) {
        let key = cache_key(context);
        let mut state = self.state.lock().await;

        if !state.entries.contains_key(&key) && state.entries.len() >= self.max_entries {
            let oldest = state
                .entries
                .values()
                .min_by_key(|e| e.created)
                .map(|e| e.key.clone());
            if let Some(oldest) = oldest {
                state.entries.remove(&oldest);
                debug!("Evicted cache entry {oldest}");
            }
        }

        let entry = CacheEntry {
            key: key.clone(),
            result,
            timestamp: Utc::now(),
            ttl: ttl.unwrap_or(self.default_ttl),
            created: Instant::now(),
        };
        state.entries.insert(key, entry);
    }

    /// Look up the entry for a context, dropping it if expired.
    pub async fn retrieve(&self, context: &CodeContext) -> Option<CacheEntry> {
        let key = cache_key(context);
        let mut state = self.state.lock().await;

        match state.entries.get(&key) {
            Some(entry) if entry.is_expired() => {
                state.entries.remove(&key);
                state.expired += 1;
                state.misses += 1;
                None
            }
            Some(entry) => {
                let entry = entry.clone();
                state.hits += 1;
                Some(entry)
            }
            None => {
                state.misses += 1;
                None
            }
        }
    }

    /// Whether a live entry exists for a context. Does not touch counters.
    pub async fn has(&self, context: &CodeContext) -> bool {
        let key = cache_key(context);
        self.state
            .lock()
            .await
            .entries
            .get(&key)
            .is_some_and(|e| !e.is_expired())
    }

    /// Drop every entry citing `file_path`, returning how many went.
    ///
    /// Uncited entries (refusals) go too: the changed file may now answer
    /// them.
    pub async fn invalidate_file(&self, file_path: &str) -> usize {
        let mut state = self.state.lock().await;
        let before = state.entries.len();
        state
            .entries
            .retain(|_, entry| !entry.result.citations.is_empty() && !entry.cites(file_path));
        let removed = before - state.entries.len();
        state.invalidations += removed as u64;
        if removed > 0 {
            debug!("Invalidated {removed} cached explanations citing {file_path}");
        }
        removed
    }

    /// Drop every expired entry, returning how many went.
    pub async fn cleanup_expired(&self) -> usize {
        let mut state = self.state.lock().await;
        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired());
        let removed = before - state.entries.len();
        state.expired += removed as u64;
        removed
    }

    /// Drop every entry. Counters are kept.
    pub async fn clear(&self) {
        self.state.lock().await.entries.clear();
    }

    pub async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        CacheStats {
            entries: state.entries.len(),
            max_entries: self.max_entries,
            hits: state.hits,
            misses: state.misses,
            expired: state.expired,
            invalidations: state.invalidations,
        }
    }
}

impl Default for ExplanationCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::Citation;
    use pretty_assertions::assert_eq;

    fn context(selected: &str) -> CodeContext {
        CodeContext::new(selected, "src/calc.js", "javascript").with_function_name("add")
    }

    fn cited(file_path: &str) -> ExplanationResult {
        ExplanationResult::grounded(
            "add: Adds numbers. (Source: README.md, add)",
            vec![Citation {
                file_path: file_path.to_string(),
                section_heading: "add".to_string(),
                relevance_score: 0.8,
            }],
            0.6,
        )
    }

    #[tokio::test]
    async fn test_store_and_retrieve() {
        let cache = ExplanationCache::default();
        assert!(cache.retrieve(&context("a + b")).await.is_none());

        cache.store(&context("a + b"), cited("README.md"), None).await;
        let entry = cache.retrieve(&context("a + b")).await.unwrap();
        assert_eq!(entry.result, cited("README.md"));
        assert_eq!(entry.ttl, Duration::from_secs(3600));
        assert!(cache.has(&context("a + b")).await);
        assert!(!cache.has(&context("a - b")).await);

        let stats = cache.stats().await;
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_key_ignores_surrounding_context() {
        let cache = ExplanationCache::default();
        cache.store(&context("a + b"), cited("README.md"), None).await;
        let wider = context("a + b").with_surrounding_context("elsewhere");
        assert!(cache.retrieve(&wider).await.is_some());
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_lazily() {
        let cache = ExplanationCache::default();
        cache
            .store(&context("a + b"), cited("README.md"), Some(Duration::ZERO))
            .await;
        assert_eq!(cache.stats().await.entries, 1);
        assert!(!cache.has(&context("a + b")).await);
        assert!(cache.retrieve(&context("a + b")).await.is_none());

        let stats = cache.stats().await;
        assert_eq!((stats.entries, stats.expired), (0, 1));
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let cache = ExplanationCache::default();
        cache.store(&context("one"), cited("README.md"), Some(Duration::ZERO)).await;
        cache.store(&context("two"), cited("README.md"), None).await;
        assert_eq!(cache.cleanup_expired().await, 1);
        assert_eq!(cache.stats().await.entries, 1);
    }

    #[tokio::test]
    async fn test_invalidate_file() {
        let cache = ExplanationCache::default();
        cache.store(&context("one"), cited("README.md"), None).await;
        cache.store(&context("two"), cited("docs/api.md"), None).await;
        cache
            .store(&context("three"), ExplanationResult::not_documented(), None)
            .await;

        assert_eq!(cache.invalidate_file("README.md").await, 2);
        assert!(!cache.has(&context("one")).await);
        assert!(cache.has(&context("two")).await);
        assert!(!cache.has(&context("three")).await);
        assert_eq!(cache.stats().await.invalidations, 2);
    }

    #[tokio::test]
    async fn test_oldest_evicted_at_capacity() {
        let cache = ExplanationCache::new(2, Duration::from_secs(60));
        cache.store(&context("one"), cited("a.md"), None).await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        cache.store(&context("two"), cited("a.md"), None).await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        cache.store(&context("three"), cited("a.md"), None).await;

        assert!(!cache.has(&context("one")).await);
        assert!(cache.has(&context("two")).await);
        assert!(cache.has(&context("three")).await);
        assert_eq!(cache.stats().await.entries, 2);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = ExplanationCache::default();
        cache.store(&context("one"), cited("a.md"), None).await;
        cache.clear().await;
        assert_eq!(cache.stats().await.entries, 0);
    }
}
