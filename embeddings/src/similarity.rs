//! Cosine similarity and nearest-neighbour selection.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{EmbeddingError, Result};

/// Cosine of the angle between `a` and `b`, in `[-1, 1]`.
///
/// A zero-norm side scores 0.0 instead of producing NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });
    let denominator = (norm_a * norm_b).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return Ok(0.0);
    }

    let cosine = dot / denominator;
    Ok(if cosine.is_nan() { 0.0 } else { cosine.clamp(-1.0, 1.0) })
}

/// One candidate that passed [`find_top_k`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    pub id: String,
    pub score: f32,
}

/// The `k` candidates closest to `query` scoring at least `min_score`.
///
/// Ordered by score descending, then id ascending. A candidate whose
/// length differs from the query is logged and left out.
pub fn find_top_k<'a, I>(
    query: &[f32],
    candidates: I,
    k: usize,
    min_score: f32,
) -> Vec<SimilarityResult>
where
    I: IntoIterator<Item = (&'a str, &'a [f32])>,
{
    let mut ranked: Vec<(OrderedFloat<f32>, &'a str)> = candidates
        .into_iter()
        .filter_map(|(id, embedding)| match cosine_similarity(query, embedding) {
            Ok(score) => (score >= min_score).then_some((OrderedFloat(score), id)),
            Err(e) => {
                warn!("Skipping embedding {id}: {e}");
                None
            }
        })
        .collect();

    ranked.sort_unstable_by(|(sa, ia), (sb, ib)| sb.cmp(sa).then_with(|| ia.cmp(ib)));
    ranked.truncate(k);

    ranked
        .into_iter()
        .map(|(score, id)| SimilarityResult {
            id: id.to_string(),
            score: score.into_inner(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cosine_reference_angles() {
        let x = [1.0, 0.0, 0.0];
        let cases = vec![
            (vec![2.0, 0.0, 0.0], 1.0),
            (vec![0.0, 3.0, 0.0], 0.0),
            (vec![-1.0, 0.0, 0.0], -1.0),
            (vec![1.0, 1.0, 0.0], std::f32::consts::FRAC_1_SQRT_2),
        ];
        for (other, expected) in cases {
            let sim = cosine_similarity(&x, &other).unwrap();
            assert!((sim - expected).abs() < 1e-6, "{other:?}: {sim}");
        }
    }

    #[test]
    fn test_cosine_zero_vector_and_range() {
        let zero = [0.0; 3];
        assert_eq!(cosine_similarity(&zero, &[0.3, 0.4, 0.0]).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero).unwrap(), 0.0);

        let v = vec![0.1f32; 128];
        assert!((-1.0..=1.0).contains(&cosine_similarity(&v, &v).unwrap()));
    }

    #[test]
    fn test_cosine_rejects_length_mismatch() {
        let err = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_find_top_k_orders_and_filters() {
        let query = [1.0, 0.0];
        let exact = [1.0, 0.0];
        let close = [0.8, 0.6];
        let far = [0.0, 1.0];
        let wrong_len = [1.0, 0.0, 0.0];
        let candidates: Vec<(&str, &[f32])> = vec![
            ("far", far.as_slice()),
            ("close", close.as_slice()),
            ("wrong", wrong_len.as_slice()),
            ("exact", exact.as_slice()),
        ];

        let ids: Vec<String> = find_top_k(&query, candidates.clone(), 10, 0.5)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["exact", "close"]);

        let top = find_top_k(&query, candidates, 1, 0.0);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].id, "exact");
    }

    #[test]
    fn test_find_top_k_breaks_ties_by_id() {
        let v = [1.0, 0.0];
        let candidates: Vec<(&str, &[f32])> =
            vec![("z", v.as_slice()), ("a", v.as_slice()), ("m", v.as_slice())];
        let ids: Vec<String> = find_top_k(&v, candidates, 3, 0.0)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "m", "z"]);
    }
}
