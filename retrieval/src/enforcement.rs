//! Documentation sufficiency rules.
//!
//! Every retrieved chunk gets a relevance score from term overlap with the
//! code context. Symbol names weigh most, then import names, then keywords
//! from the selection, plus a small bonus for substantial sections. A request
//! is answered only when a chunk clears both the relevance threshold and the
//! content floor, and a lone qualifying chunk is not a placeholder stub.

use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use docent_code_context::CodeContext;
use docent_doc_index::DocumentationChunk;
use docent_embeddings::{identifier_parts, tokenize};

use crate::config::EnforcementConfig;
use crate::keywords::{contains_phrase, extract_keywords};

const HEADING_SYMBOL_WEIGHT: f32 = 0.5;
const CONTENT_SYMBOL_WEIGHT: f32 = 0.4;
const SYMBOL_PARTS_WEIGHT: f32 = 0.3;
const IMPORT_WEIGHT: f32 = 0.2;
const MAX_IMPORT_SCORE: f32 = 0.4;
const KEYWORD_WEIGHT: f32 = 0.3;
const LENGTH_BONUS: f32 = 0.05;

/// Word counts earning the length bonus, once per step.
const LENGTH_BONUS_STEPS: [usize; 2] = [20, 50];

/// Shortest import basename that counts as a match.
const MIN_IMPORT_NAME_CHARS: usize = 3;

/// A retrieved chunk with its similarity and relevance.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: DocumentationChunk,

    /// Cosine similarity from the store.
    pub similarity: f32,

    /// Term-overlap relevance in `[0, 1]`.
    pub relevance: f32,
}

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NoChunks,
    BelowRelevance,
    TooShort,
    Placeholder,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::NoChunks => "no documentation retrieved",
            Self::BelowRelevance => "no chunk passed the relevance threshold",
            Self::TooShort => "relevant chunks are too short",
            Self::Placeholder => "the only relevant chunk is a placeholder",
        };
        f.write_str(reason)
    }
}

/// Outcome of enforcement.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Qualifying chunks, most relevant first.
    Accepted(Vec<ScoredChunk>),
    Rejected(Rejection),
}

/// Applies the sufficiency rules.
#[derive(Debug, Clone)]
pub struct Enforcer {
    config: EnforcementConfig,
}

impl Enforcer {
    pub fn new(config: EnforcementConfig) -> Self {
        Self { config }
    }

    /// Attach a relevance score to every retrieved chunk, keeping order.
    pub fn score(
        &self,
        context: &CodeContext,
        retrieved: Vec<(DocumentationChunk, f32)>,
    ) -> Vec<ScoredChunk> {
        let terms = ContextTerms::new(context);
        retrieved
            .into_iter()
            .map(|(chunk, similarity)| ScoredChunk {
                relevance: terms.relevance(&chunk),
                chunk,
                similarity,
            })
            .collect()
    }

    /// Decide whether the scored chunks justify an answer.
    pub fn enforce(&self, scored: &[ScoredChunk]) -> Verdict {
        if scored.is_empty() {
            return Verdict::Rejected(Rejection::NoChunks);
        }

        let relevant: Vec<&ScoredChunk> = scored
            .iter()
            .filter(|s| s.relevance > self.config.min_relevance)
            .collect();
        if relevant.is_empty() {
            return Verdict::Rejected(Rejection::BelowRelevance);
        }

        let mut qualifying: Vec<ScoredChunk> = relevant
            .into_iter()
            .filter(|s| s.chunk.content.trim().chars().count() >= self.config.min_content_chars)
            .cloned()
            .collect();
        if qualifying.is_empty() {
            return Verdict::Rejected(Rejection::TooShort);
        }

        if let [only] = qualifying.as_slice() {
            if let Some(phrase) = self.placeholder_in(&only.chunk) {
                debug!("Chunk {} looks like a stub ({phrase})", only.chunk.id);
                return Verdict::Rejected(Rejection::Placeholder);
            }
        }

        // Stable, so equal relevance keeps the caller's order.
        qualifying.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
        Verdict::Accepted(qualifying)
    }

    fn placeholder_in(&self, chunk: &DocumentationChunk) -> Option<&str> {
        self.config
            .placeholder_phrases
            .iter()
            .map(String::as_str)
            .find(|phrase| contains_phrase(&chunk.content, phrase))
    }
}

/// Terms from a code context, prepared once per request.
struct ContextTerms {
    symbols: Vec<String>,
    import_names: Vec<String>,
    keywords: Vec<String>,
}

impl ContextTerms {
    fn new(context: &CodeContext) -> Self {
        let symbols = [&context.function_name, &context.class_name]
            .into_iter()
            .flatten()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();

        let import_names = context
            .imports
            .iter()
            .filter_map(|target| import_basename(target))
            .collect();

        Self {
            symbols,
            import_names,
            keywords: extract_keywords(&context.selected_text),
        }
    }

    fn relevance(&self, chunk: &DocumentationChunk) -> f32 {
        let heading = chunk.section_heading.to_lowercase();
        let content = chunk.content.to_lowercase();
        let chunk_tokens: HashSet<String> = tokenize(&chunk.section_heading)
            .into_iter()
            .chain(tokenize(&chunk.content))
            .collect();

        let symbol_score = self
            .symbols
            .iter()
            .map(|name| symbol_match(name, &heading, &content, &chunk_tokens))
            .fold(0.0_f32, f32::max);

        let import_hits = self
            .import_names
            .iter()
            .filter(|name| contains_phrase(&heading, name) || contains_phrase(&content, name))
            .count();
        let import_score = (import_hits as f32 * IMPORT_WEIGHT).min(MAX_IMPORT_SCORE);

        let keyword_score = if self.keywords.is_empty() {
            0.0
        } else {
            let hits = self
                .keywords
                .iter()
                .filter(|k| chunk_tokens.contains(k.as_str()))
                .count();
            hits as f32 / self.keywords.len() as f32 * KEYWORD_WEIGHT
        };

        let length_bonus = LENGTH_BONUS_STEPS
            .iter()
            .filter(|&&step| chunk.metadata.word_count >= step)
            .count() as f32
            * LENGTH_BONUS;

        (symbol_score + import_score + keyword_score + length_bonus).clamp(0.0, 1.0)
    }
}

fn symbol_match(name: &str, heading: &str, content: &str, chunk_tokens: &HashSet<String>) -> f32 {
    let lowered = name.to_lowercase();
    if heading.contains(&lowered) {
        return HEADING_SYMBOL_WEIGHT;
    }
    if content.contains(&lowered) {
        return CONTENT_SYMBOL_WEIGHT;
    }

    let parts = identifier_parts(name);
    if parts.len() > 1 && parts.iter().all(|p| chunk_tokens.contains(p.as_str())) {
        SYMBOL_PARTS_WEIGHT
    } else {
        0.0
    }
}

/// Last path segment of an import target, minus any extension.
///
/// `@scope/pkg/sub` gives `sub`; names shorter than three chars give `None`.
fn import_basename(target: &str) -> Option<String> {
    let last = target.trim_end_matches('/').rsplit('/').next()?;
    let stem = last.split('.').next().unwrap_or(last);
    let stem = stem.trim_start_matches('@').to_lowercase();
    (stem.chars().count() >= MIN_IMPORT_NAME_CHARS).then_some(stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn chunk(file: &str, heading: &str, content: &str) -> DocumentationChunk {
        DocumentationChunk::new(
            format!("{file}#{heading}"),
            file,
            heading,
            content,
            2,
            Utc::now(),
        )
    }

    fn sum_context() -> CodeContext {
        CodeContext::new("function calculateSum(a,b){return a+b;}", "math.js", "javascript")
            .with_function_name("calculateSum")
    }

    fn enforcer() -> Enforcer {
        Enforcer::new(EnforcementConfig::default())
    }

    #[test]
    fn test_heading_symbol_match_qualifies() {
        let enforcer = enforcer();
        let scored = enforcer.score(
            &sum_context(),
            vec![(
                chunk(
                    "README.md",
                    "calculateSum",
                    "Adds two numbers together and returns the result.",
                ),
                0.4,
            )],
        );
        assert!(scored[0].relevance >= HEADING_SYMBOL_WEIGHT);

        match enforcer.enforce(&scored) {
            Verdict::Accepted(chunks) => assert_eq!(chunks.len(), 1),
            Verdict::Rejected(reason) => panic!("rejected: {reason}"),
        }
    }

    #[test]
    fn test_empty_retrieval_rejected() {
        assert_eq!(enforcer().enforce(&[]), Verdict::Rejected(Rejection::NoChunks));
    }

    #[test]
    fn test_unrelated_chunk_below_relevance() {
        let enforcer = enforcer();
        let scored = enforcer.score(
            &sum_context(),
            vec![(chunk("docs/a.md", "Deployment", "Ship the container to the cluster."), 0.2)],
        );
        assert_eq!(enforcer.enforce(&scored), Verdict::Rejected(Rejection::BelowRelevance));
    }

    #[test]
    fn test_stub_chunks_rejected() {
        let enforcer = enforcer();

        let scored =
            enforcer.score(&sum_context(), vec![(chunk("README.md", "calculateSum", "TODO"), 0.9)]);
        assert_eq!(enforcer.enforce(&scored), Verdict::Rejected(Rejection::TooShort));

        let scored = enforcer.score(
            &sum_context(),
            vec![(
                chunk(
                    "README.md",
                    "calculateSum",
                    "Not implemented yet, documentation coming soon.",
                ),
                0.9,
            )],
        );
        assert_eq!(enforcer.enforce(&scored), Verdict::Rejected(Rejection::Placeholder));
    }

    #[test]
    fn test_placeholder_tolerated_with_other_support() {
        let enforcer = enforcer();
        let scored = enforcer.score(
            &sum_context(),
            vec![
                (
                    chunk("README.md", "calculateSum", "Adds two numbers. TODO: overflow notes."),
                    0.9,
                ),
                (
                    chunk("docs/math.md", "Arithmetic", "calculateSum handles integer addition."),
                    0.5,
                ),
            ],
        );
        assert!(matches!(enforcer.enforce(&scored), Verdict::Accepted(ref c) if c.len() == 2));
    }

    #[test]
    fn test_accepted_sorted_by_relevance() {
        let enforcer = enforcer();
        let scored = enforcer.score(
            &sum_context(),
            vec![
                (chunk("docs/a.md", "Arithmetic", "The calculateSum helper adds values."), 0.3),
                (
                    chunk("docs/b.md", "calculateSum", "Adds two numbers and returns the total."),
                    0.3,
                ),
            ],
        );
        let Verdict::Accepted(chunks) = enforcer.enforce(&scored) else {
            panic!("expected acceptance");
        };
        assert_eq!(chunks[0].chunk.file_path, "docs/b.md");
        assert!(chunks[0].relevance >= chunks[1].relevance);
    }

    #[test]
    fn test_symbol_parts_and_imports() {
        let context = CodeContext::new("sum(a, b)", "m.js", "javascript")
            .with_function_name("calculateSum")
            .with_imports(vec!["./local".to_string(), "@acme/mathlib".to_string()]);
        let enforcer = enforcer();
        let scored = enforcer.score(
            &context,
            vec![(
                chunk("docs/m.md", "Totals", "We calculate the sum using mathlib routines."),
                0.1,
            )],
        );
        let expected = SYMBOL_PARTS_WEIGHT + IMPORT_WEIGHT + KEYWORD_WEIGHT;
        assert!((scored[0].relevance - expected).abs() < 1e-6);
    }

    #[test]
    fn test_import_basename() {
        assert_eq!(import_basename("lodash").as_deref(), Some("lodash"));
        assert_eq!(import_basename("@scope/pkg/utils.js").as_deref(), Some("utils"));
        assert_eq!(import_basename("fs"), None);
    }
}
