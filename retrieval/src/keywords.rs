//! Keyword extraction for relevance scoring and grounding checks.

use std::collections::HashSet;

/// Minimum keyword length in chars.
const MIN_KEYWORD_CHARS: usize = 3;

/// English stop words, ignored when comparing prose.
const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "may", "might", "must", "shall",
    "can", "need", "to", "of", "in", "for", "on", "with", "at", "by", "from", "as", "into",
    "through", "during", "before", "after", "above", "below", "between", "under", "again",
    "then", "once", "here", "there", "when", "where", "why", "how", "all", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "just", "and", "but", "if", "or", "because", "until", "while", "what",
    "which", "who", "whom", "this", "that", "these", "those", "it", "its", "they", "them",
    "their", "we", "our", "you", "your", "also", "any", "both", "either", "via", "using", "uses",
    "use", "source", "documented",
];

/// JavaScript and TypeScript reserved words, ignored in code.
const RESERVED_WORDS: &[&str] = &[
    "async", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "else", "enum", "export", "extends", "false", "finally", "for",
    "function", "if", "implements", "import", "in", "instanceof", "interface", "let", "new",
    "null", "package", "private", "protected", "public", "require", "return", "static", "super",
    "switch", "this", "throw", "true", "try", "typeof", "undefined", "var", "void", "while",
    "with", "yield", "type", "readonly", "abstract", "declare", "namespace", "number", "string",
    "boolean", "any", "unknown", "never", "from", "of", "as",
];

/// Identifier-like tokens in code, lowercased and deduplicated in first-seen order.
///
/// Reserved words and tokens shorter than three chars are skipped.
pub fn extract_keywords(code: &str) -> Vec<String> {
    let reserved: HashSet<&str> = RESERVED_WORDS.iter().copied().collect();
    let mut seen = HashSet::new();

    code.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
        .map(|word| word.trim_matches(|c| c == '_' || c == '$'))
        .filter(|word| word.chars().count() >= MIN_KEYWORD_CHARS)
        .filter(|word| !word.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_lowercase)
        .filter(|word| !reserved.contains(word.as_str()))
        .filter(|word| seen.insert(word.clone()))
        .collect()
}

/// Lowercased prose words that carry meaning, in order, duplicates kept.
pub fn meaningful_words(text: &str) -> Vec<String> {
    let stop_words: HashSet<&str> = STOP_WORDS.iter().copied().collect();

    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|word| word.chars().count() >= MIN_KEYWORD_CHARS)
        .map(str::to_lowercase)
        .filter(|word| !stop_words.contains(word.as_str()))
        .collect()
}

/// Whether `phrase` occurs in `text` as whole words, ignoring case.
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    let text = text.to_lowercase();
    let phrase = phrase.trim().to_lowercase();
    if phrase.is_empty() {
        return false;
    }

    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    text.match_indices(&phrase).any(|(start, _)| {
        let end = start + phrase.len();
        let before_ok = text[..start].chars().next_back().is_none_or(|c| !is_word(c));
        let after_ok = text[end..].chars().next().is_none_or(|c| !is_word(c));
        before_ok && after_ok
    })
}
