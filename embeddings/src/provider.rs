//! Embedding providers.
//!
//! Only the offline [`HashEmbeddingProvider`] ships: it needs no model files
//! and no network, and it is reproducible bit-for-bit across runs.

use std::collections::HashMap;
use std::f32::consts::TAU;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EmbeddingError, Result};
use crate::tokenize::tokenize;
use crate::{DEFAULT_DIMENSION, Embedding};

/// Upper bound on input size accepted by [`HashEmbeddingProvider`].
const MAX_TEXT_CHARS: usize = 1_000_000;

/// Request for generating embeddings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Text to embed.
    pub text: String,
}

impl EmbeddingRequest {
    /// Create a new embedding request.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Response from embedding generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// The generated embedding.
    pub embedding: Embedding,

    /// Model used to generate the embedding.
    pub model: String,

    /// Dimension of the embedding.
    pub dimension: usize,

    /// Number of tokens that contributed to the vector.
    pub tokens_used: Option<u64>,
}

/// Source of text embeddings.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Length of every vector this provider returns.
    fn dimension(&self) -> usize;

    /// Embed one text. Callers embedding many texts call this per item so
    /// one failure does not discard the rest.
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse>;
}

/// Deterministic token-hash embedding provider.
///
/// Every token contributes a sinusoid across all dimensions whose phase and
/// frequency are derived from the token's FNV-1a hash. Contributions are
/// weighted by damped term frequency and first position, summed, and
/// L2-normalized. Text without tokens maps to the all-zero vector.
#[derive(Debug, Clone)]
pub struct HashEmbeddingProvider {
    dimension: usize,
}

impl HashEmbeddingProvider {
    /// Create a provider with the default dimension.
    pub fn new() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
        }
    }

    /// Create a provider with a custom dimension.
    pub fn with_dimension(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(EmbeddingError::InvalidDimension(dimension));
        }
        Ok(Self { dimension })
    }

    /// Embed text synchronously.
    ///
    /// The async [`EmbeddingProvider::embed`] delegates here; callers outside
    /// an async context can use this directly.
    pub fn embed_text(&self, text: &str) -> Result<Embedding> {
        let length = text.chars().count();
        if length > MAX_TEXT_CHARS {
            return Err(EmbeddingError::TextTooLong {
                length,
                max_length: MAX_TEXT_CHARS,
            });
        }

        let mut vector = vec![0.0f32; self.dimension];
        for (token, weight) in weighted_terms(text) {
            let hash = fnv1a(token.as_bytes());
            let phase = (hash % 10_007) as f32 / 10_007.0 * TAU;
            let freq = 0.5 + ((hash >> 20) % 1_009) as f32 / 1_009.0 * 3.0;
            for (d, slot) in vector.iter_mut().enumerate() {
                *slot += weight * (phase + freq * (d as f32 + 1.0)).sin();
            }
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if !norm.is_finite() {
            return Err(EmbeddingError::NonFinite);
        }
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }

        Ok(vector)
    }
}

impl Default for HashEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    fn name(&self) -> &str {
        "hash"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        let embedding = self.embed_text(&request.text)?;
        let tokens_used = tokenize(&request.text).len() as u64;
        debug!("Generated hash embedding from {tokens_used} tokens");

        Ok(EmbeddingResponse {
            dimension: embedding.len(),
            embedding,
            model: format!("hash-{}", self.dimension),
            tokens_used: Some(tokens_used),
        })
    }
}

/// Distinct tokens with their contribution weight, in first-seen order.
///
/// Weight is `(1 + ln tf) / (1 + 0.01 * first_position)`.
fn weighted_terms(text: &str) -> Vec<(String, f32)> {
    let mut order: Vec<String> = Vec::new();
    let mut stats: HashMap<String, (usize, u32)> = HashMap::new();

    for (position, token) in tokenize(text).into_iter().enumerate() {
        match stats.get_mut(&token) {
            Some((_, count)) => *count += 1,
            None => {
                stats.insert(token.clone(), (position, 1));
                order.push(token);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|token| {
            let (first, count) = stats.get(&token).copied()?;
            let weight = (1.0 + (count as f32).ln()) / (1.0 + 0.01 * first as f32);
            Some((token, weight))
        })
        .collect()
}

/// 64-bit FNV-1a; stable across platforms and releases.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::cosine_similarity;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_embedding_is_deterministic() {
        let provider = HashEmbeddingProvider::new();
        let a = provider.embed_text("Adds two numbers together").unwrap();
        let b = provider.embed_text("Adds two numbers together").unwrap();
        let bits_a: Vec<u32> = a.iter().map(|x| x.to_bits()).collect();
        let bits_b: Vec<u32> = b.iter().map(|x| x.to_bits()).collect();
        assert_eq!(bits_a, bits_b);
        assert_eq!(a.len(), DEFAULT_DIMENSION);
    }

    #[test]
    fn test_embedding_is_normalized() {
        let provider = HashEmbeddingProvider::new();
        let v = provider.embed_text("parse the configuration file").unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_degenerate_input_is_zero_vector() {
        let provider = HashEmbeddingProvider::with_dimension(16).unwrap();
        assert_eq!(provider.embed_text("").unwrap(), vec![0.0; 16]);
        assert_eq!(provider.embed_text("  \n\t").unwrap(), vec![0.0; 16]);
    }

    #[test]
    fn test_shared_terms_score_higher() {
        let provider = HashEmbeddingProvider::new();
        let query = provider
            .embed_text("function calculateSum(a,b){return a+b;} function calculateSum")
            .unwrap();
        let related = provider
            .embed_text("calculateSum\nAdds two numbers and returns the sum.")
            .unwrap();
        let unrelated = provider
            .embed_text("Deployment\nConfigure the staging cluster credentials.")
            .unwrap();

        let near = cosine_similarity(&query, &related).unwrap();
        let far = cosine_similarity(&query, &unrelated).unwrap();
        assert!(near > far, "near={near} far={far}");
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(HashEmbeddingProvider::with_dimension(0).is_err());
    }

    #[tokio::test]
    async fn test_async_embed_reports_model() {
        let provider = HashEmbeddingProvider::new();
        let response = provider
            .embed(EmbeddingRequest::new("hello world"))
            .await
            .unwrap();
        assert_eq!(response.model, "hash-128");
        assert_eq!(response.dimension, 128);
        assert_eq!(response.tokens_used, Some(2));
    }
}
