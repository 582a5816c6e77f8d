//! Explanation synthesis and the grounding check.
//!
//! The explanation is assembled only from documentation text: an opener
//! naming the symbol, the sentences of the top chunk that share the most
//! terms with the code, and a source marker for that chunk. The whole
//! explanation must then share enough meaningful words with the retrieved
//! documentation, or the answer is downgraded to "Not documented.".

use std::collections::HashSet;

use tracing::debug;

use docent_code_context::CodeContext;
use docent_doc_index::DocumentationChunk;
use docent_embeddings::tokenize;

use crate::enforcement::ScoredChunk;
use crate::keywords::{extract_keywords, meaningful_words};
use crate::result::{Citation, ExplanationResult};

/// Sentences taken from the top chunk.
const MAX_SENTENCES: usize = 2;

/// Qualifying chunks counted towards confidence.
const MAX_CONFIDENCE_CHUNKS: usize = 3;

const BASE_CONFIDENCE: f32 = 0.3;
const PER_CHUNK_CONFIDENCE: f32 = 0.15;
const LENGTH_CONFIDENCE: f32 = 0.25;

/// Average word count earning the full length share of confidence.
const FULL_LENGTH_WORDS: f32 = 100.0;

/// Builds explanations from accepted chunks.
#[derive(Debug, Clone)]
pub struct Generator {
    min_grounding_ratio: f32,
}

impl Generator {
    pub fn new(min_grounding_ratio: f32) -> Self {
        Self {
            min_grounding_ratio,
        }
    }

    /// Produce the result for an accepted request.
    ///
    /// `accepted` must be sorted by relevance, most relevant first.
    /// `retrieved` is everything the store returned and is what the
    /// explanation is checked against.
    pub fn generate(
        &self,
        context: &CodeContext,
        accepted: &[ScoredChunk],
        retrieved: &[ScoredChunk],
    ) -> ExplanationResult {
        let Some(primary) = accepted.first() else {
            return ExplanationResult::not_documented();
        };

        let explanation = format!(
            "{}{} (Source: {}, {})",
            opener(context),
            explanation_body(context, &primary.chunk),
            primary.chunk.file_path,
            primary.chunk.section_heading
        );
        let ratio = grounding_ratio(&explanation, retrieved.iter().map(|s| &s.chunk));
        if ratio < self.min_grounding_ratio {
            debug!(
                "Grounding ratio {ratio:.2} below {:.2}, refusing",
                self.min_grounding_ratio
            );
            return ExplanationResult::not_documented();
        }

        ExplanationResult::grounded(explanation, citations(accepted), confidence(accepted))
    }
}

/// `Class.method: `, `method: `, `Class: ` or nothing.
fn opener(context: &CodeContext) -> String {
    let function = context.function_name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let class = context.class_name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    match (class, function) {
        (Some(class), Some(function)) => format!("{class}.{function}: "),
        (None, Some(name)) | (Some(name), None) => format!("{name}: "),
        (None, None) => String::new(),
    }
}

fn explanation_body(context: &CodeContext, chunk: &DocumentationChunk) -> String {
    let terms = context_terms(context);
    let sentences = split_sentences(&chunk.content);

    let mut ranked: Vec<(usize, usize)> = sentences
        .iter()
        .enumerate()
        .map(|(i, sentence)| {
            let overlap = tokenize(sentence)
                .into_iter()
                .collect::<HashSet<_>>()
                .intersection(&terms)
                .count();
            (i, overlap)
        })
        .filter(|&(_, overlap)| overlap > 0)
        .collect();

    if ranked.is_empty() {
        return match sentences.first() {
            Some(first) => format!("Documented under \"{}\": {first}", chunk.section_heading),
            None => format!("Documented under \"{}\".", chunk.section_heading),
        };
    }

    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(MAX_SENTENCES);
    ranked.sort_by_key(|&(i, _)| i);

    ranked
        .iter()
        .filter_map(|&(i, _)| sentences.get(i).map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercase tokens describing the code: symbol names, import names and
/// selection keywords, with identifier parts.
fn context_terms(context: &CodeContext) -> HashSet<String> {
    let mut text = String::new();
    for name in [&context.function_name, &context.class_name].into_iter().flatten() {
        text.push_str(name);
        text.push(' ');
    }
    for import in &context.imports {
        text.push_str(import);
        text.push(' ');
    }
    for keyword in extract_keywords(&context.selected_text) {
        text.push_str(&keyword);
        text.push(' ');
    }
    tokenize(&text).into_iter().collect()
}

/// Prose sentences of a markdown section, whitespace collapsed.
///
/// Fenced code blocks are skipped and blank lines end a sentence.
pub fn split_sentences(content: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut in_fence = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            flush(&mut current, &mut sentences);
            continue;
        }
        if in_fence {
            continue;
        }
        if trimmed.is_empty() {
            flush(&mut current, &mut sentences);
            continue;
        }

        let text = trimmed
            .trim_start_matches(['-', '*', '+', '>'])
            .trim_start();
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            current.push(c);
            let at_boundary = chars.peek().is_none_or(|next| next.is_whitespace());
            if matches!(c, '.' | '!' | '?') && at_boundary {
                flush(&mut current, &mut sentences);
            }
        }
        current.push(' ');
    }
    flush(&mut current, &mut sentences);
    sentences
}

fn flush(current: &mut String, sentences: &mut Vec<String>) {
    let sentence = current.split_whitespace().collect::<Vec<_>>().join(" ");
    if sentence.chars().any(char::is_alphanumeric) {
        sentences.push(sentence);
    }
    current.clear();
}

/// Share of the explanation's meaningful words found in the documentation.
///
/// Zero when the explanation has no meaningful words.
pub fn grounding_ratio<'a>(
    explanation: &str,
    documentation: impl IntoIterator<Item = &'a DocumentationChunk>,
) -> f32 {
    let words = meaningful_words(explanation);
    if words.is_empty() {
        return 0.0;
    }

    let mut vocabulary = HashSet::new();
    for chunk in documentation {
        vocabulary.extend(meaningful_words(&chunk.file_path));
        vocabulary.extend(meaningful_words(&chunk.section_heading));
        vocabulary.extend(meaningful_words(&chunk.content));
    }

    let grounded = words.iter().filter(|w| vocabulary.contains(*w)).count();
    grounded as f32 / words.len() as f32
}

/// One citation per distinct section, most relevant first.
fn citations(accepted: &[ScoredChunk]) -> Vec<Citation> {
    let mut seen = HashSet::new();
    let mut citations: Vec<Citation> = accepted
        .iter()
        .filter(|s| seen.insert((s.chunk.file_path.as_str(), s.chunk.section_heading.as_str())))
        .map(|s| Citation {
            file_path: s.chunk.file_path.clone(),
            section_heading: s.chunk.section_heading.clone(),
            relevance_score: s.relevance.clamp(0.0, 1.0),
        })
        .collect();
    citations.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
    citations
}

fn confidence(accepted: &[ScoredChunk]) -> f32 {
    let counted = &accepted[..accepted.len().min(MAX_CONFIDENCE_CHUNKS)];
    if counted.is_empty() {
        return 0.0;
    }

    let total_words: usize = counted.iter().map(|s| s.chunk.metadata.word_count).sum();
    let average = total_words as f32 / counted.len() as f32;
    let length_share = (average / FULL_LENGTH_WORDS).min(1.0);

    (BASE_CONFIDENCE
        + PER_CHUNK_CONFIDENCE * counted.len() as f32
        + LENGTH_CONFIDENCE * length_share)
        .clamp(0.0, 1.0)
}
