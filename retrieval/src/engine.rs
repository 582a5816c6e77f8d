//! The explanation engine.
//!
//! Per request: validate, join an identical in-flight request, check the
//! cache, retrieve, enforce, generate, check grounding, then cache. Only
//! malformed input is an error; every internal failure becomes a fallback
//! [`ExplanationResult`].

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use docent_code_context::{CodeContext, ContextBuilder};
use docent_doc_index::DocumentationChunk;
use docent_embeddings::HashEmbeddingProvider;
use docent_vector_store::{StoreConfig, VectorStore};

use crate::cache::{CacheStats, ExplanationCache};
use crate::config::DocentConfig;
use crate::enforcement::{Enforcer, Verdict};
use crate::error::{Result, RetrievalError};
use crate::generator::Generator;
use crate::hashing::context_hash;
use crate::inflight::InFlightRegistry;
use crate::result::{ExplanationResult, FailureKind};

/// Overall engine health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Result of [`ExplanationEngine::health_check`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    pub issues: Vec<String>,
    pub chunk_count: usize,
    pub cache: CacheStats,
}

/// Documentation-grounded explanation engine.
///
/// Cheap to clone; clones share the store, cache and in-flight registry.
#[derive(Clone)]
pub struct ExplanationEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: DocentConfig,
    store: Arc<VectorStore>,
    cache: ExplanationCache,
    context_builder: ContextBuilder,
    enforcer: Enforcer,
    generator: Generator,
    inflight: InFlightRegistry,
    retrievals: AtomicUsize,
}

impl ExplanationEngine {
    /// Create an engine over an existing store.
    pub fn new(config: DocentConfig, store: Arc<VectorStore>) -> Self {
        let inner = EngineInner {
            cache: ExplanationCache::from_config(&config.cache),
            context_builder: ContextBuilder::new(),
            enforcer: Enforcer::new(config.enforcement.clone()),
            generator: Generator::new(config.enforcement.min_grounding_ratio),
            inflight: InFlightRegistry::new(),
            retrievals: AtomicUsize::new(0),
            store,
            config,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Validate `config`, then open and initialize the workspace index.
    pub async fn open(workspace_root: &Path, config: DocentConfig) -> Result<Self> {
        config.validate()?;

        let provider = HashEmbeddingProvider::with_dimension(config.embedding.dimension)?;
        let store_config = StoreConfig::new(config.index_dir(workspace_root))
            .with_similarity_threshold(config.retrieval.similarity_threshold)
            .with_max_results(config.retrieval.max_results);
        let store = VectorStore::new(store_config, Arc::new(provider));
        store.initialize().await?;

        info!("Opened documentation index for {}", workspace_root.display());
        Ok(Self::new(config, Arc::new(store)))
    }

    pub fn config(&self) -> &DocentConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<VectorStore> {
        &self.inner.store
    }

    pub fn cache(&self) -> &ExplanationCache {
        &self.inner.cache
    }

    /// Number of similarity searches run so far.
    pub fn retrieval_count(&self) -> usize {
        self.inner.retrievals.load(Ordering::SeqCst)
    }

    /// Explain a code selection from the workspace documentation.
    ///
    /// Identical concurrent requests share one computation. Returns `Err`
    /// only for malformed input.
    pub async fn explain_code(&self, context: &CodeContext) -> Result<ExplanationResult> {
        validate(context)?;
        if context.is_blank() {
            return Ok(ExplanationResult::no_selection());
        }

        let engine = self.clone();
        let owned = context.clone();
        let result = self
            .inner
            .inflight
            .run(context_hash(context), async move {
                engine.explain_uncoalesced(&owned).await
            })
            .await;
        Ok(result)
    }

    /// Like [`Self::explain_code`], abandoning the request once `token` fires.
    ///
    /// The token is checked before retrieval, after retrieval and after
    /// generation. A cancelled request returns `Ok(None)` and leaves the
    /// cache untouched. Cancellable requests are not shared with others.
    pub async fn explain_code_cancellable(
        &self,
        context: &CodeContext,
        token: &CancellationToken,
    ) -> Result<Option<ExplanationResult>> {
        validate(context)?;
        if context.is_blank() {
            return Ok(Some(ExplanationResult::no_selection()));
        }
        if token.is_cancelled() {
            return Ok(None);
        }

        if let Some(cached) = self.cached(context).await {
            return Ok(Some(cached));
        }

        match self.resolve(context, Some(token)).await {
            Ok(Some(result)) => {
                self.remember(context, &result).await;
                Ok(Some(result))
            }
            Ok(None) => {
                debug!("Explanation for {} cancelled", context.file_name);
                Ok(None)
            }
            Err(e) => Ok(Some(fallback(&e))),
        }
    }

    /// Explain an untyped request from the editor boundary.
    pub async fn explain_json(&self, request: serde_json::Value) -> Result<ExplanationResult> {
        let Some(fields) = request.as_object() else {
            return Err(RetrievalError::InvalidInput(
                "request must be a JSON object".to_string(),
            ));
        };
        if !fields.get("selectedText").is_some_and(serde_json::Value::is_string) {
            return Err(RetrievalError::InvalidInput(
                "selectedText must be a string".to_string(),
            ));
        }

        let context: CodeContext = serde_json::from_value(request)
            .map_err(|e| RetrievalError::InvalidInput(e.to_string()))?;
        self.explain_code(&context).await
    }

    async fn explain_uncoalesced(&self, context: &CodeContext) -> ExplanationResult {
        if let Some(cached) = self.cached(context).await {
            return cached;
        }

        match self.resolve(context, None).await {
            Ok(Some(result)) => {
                self.remember(context, &result).await;
                result
            }
            // Only a cancellation token can abandon a request.
            Ok(None) => ExplanationResult::not_documented(),
            Err(e) => fallback(&e),
        }
    }

    async fn cached(&self, context: &CodeContext) -> Option<ExplanationResult> {
        if !self.inner.config.cache.enabled {
            return None;
        }
        let entry = self.inner.cache.retrieve(context).await?;
        debug!("Cache hit for {}", context.file_name);
        Some(entry.result)
    }

    async fn remember(&self, context: &CodeContext, result: &ExplanationResult) {
        if self.inner.config.cache.enabled && !result.is_failure() {
            self.inner.cache.store(context, result.clone(), None).await;
        }
    }

    /// Retrieval through grounding. `Ok(None)` means cancelled.
    async fn resolve(
        &self,
        context: &CodeContext,
        token: Option<&CancellationToken>,
    ) -> Result<Option<ExplanationResult>> {
        let inner = &self.inner;
        if !inner.config.retrieval.enabled {
            debug!("Retrieval disabled, refusing");
            return Ok(Some(ExplanationResult::not_documented()));
        }
        if is_cancelled(token) {
            return Ok(None);
        }

        inner.store.initialize().await?;
        let query = inner.context_builder.build_query_string(context);
        inner.retrievals.fetch_add(1, Ordering::SeqCst);
        let mut retrieved = inner
            .store
            .search_scored(&query, inner.config.retrieval.top_k)
            .await?;
        if is_cancelled(token) {
            return Ok(None);
        }

        retrieved.sort_by(|(a, _), (b, _)| section_order(a, b));
        let scored = inner.enforcer.score(context, retrieved);
        let result = match inner.enforcer.enforce(&scored) {
            Verdict::Accepted(accepted) => inner.generator.generate(context, &accepted, &scored),
            Verdict::Rejected(reason) => {
                debug!("Refusing explanation for {}: {reason}", context.file_name);
                ExplanationResult::not_documented()
            }
        };
        if is_cancelled(token) {
            return Ok(None);
        }

        Ok(Some(result))
    }

    /// Drop cached explanations citing a re-indexed file.
    pub async fn on_file_reindexed(&self, file_path: &str) -> usize {
        self.inner.cache.invalidate_file(file_path).await
    }

    /// Aggregate store, index and configuration health.
    pub async fn health_check(&self) -> HealthReport {
        let store = self.inner.store.health_check().await;
        let mut issues = store.issues;
        let mut status = if store.closed || !store.initialized {
            HealthStatus::Unhealthy
        } else if issues.is_empty() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };

        if status != HealthStatus::Unhealthy && store.chunk_count == 0 {
            issues.push("documentation index is empty; run indexing".to_string());
            status = status.max_with(HealthStatus::Degraded);
        }
        if !self.inner.config.retrieval.enabled {
            issues.push("retrieval is disabled".to_string());
            status = status.max_with(HealthStatus::Degraded);
        }

        HealthReport {
            status,
            issues,
            chunk_count: store.chunk_count,
            cache: self.inner.cache.stats().await,
        }
    }
}

impl HealthStatus {
    /// The worse of two statuses.
    fn max_with(self, other: Self) -> Self {
        match (self, other) {
            (Self::Unhealthy, _) | (_, Self::Unhealthy) => Self::Unhealthy,
            (Self::Degraded, _) | (_, Self::Degraded) => Self::Degraded,
            _ => Self::Healthy,
        }
    }
}

fn validate(context: &CodeContext) -> Result<()> {
    if context.file_name.chars().any(char::is_control) {
        return Err(RetrievalError::InvalidInput(
            "fileName contains control characters".to_string(),
        ));
    }
    Ok(())
}

fn is_cancelled(token: Option<&CancellationToken>) -> bool {
    token.is_some_and(CancellationToken::is_cancelled)
}

/// Deterministic order by file, heading, then ID.
fn section_order(a: &DocumentationChunk, b: &DocumentationChunk) -> std::cmp::Ordering {
    a.file_path
        .cmp(&b.file_path)
        .then_with(|| a.section_heading.cmp(&b.section_heading))
        .then_with(|| a.id.cmp(&b.id))
}

fn fallback(error: &RetrievalError) -> ExplanationResult {
    let kind = FailureKind::from_error(error);
    warn!("Explanation failed ({kind:?}): {error}");
    ExplanationResult::failure(kind)
}
