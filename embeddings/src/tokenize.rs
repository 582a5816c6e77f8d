//! Identifier-aware tokenization.
//!
//! Source code and documentation name the same things differently
//! (`calculateSum` in code, "calculateSum" or "calculate sum" in prose), so
//! compound identifiers emit both the whole lowercased identifier and its
//! camelCase / snake_case parts.

/// Minimum token length (in chars) kept by [`tokenize`].
const MIN_TOKEN_CHARS: usize = 2;

/// Split text into lowercase tokens, in order of appearance.
///
/// Words are maximal runs of alphanumerics, `_` and `$`. Each word yields its
/// lowercased form; compound identifiers additionally yield their parts.
/// Tokens shorter than two characters are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();

    for word in text.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$')) {
        let word = word.trim_matches(|c| c == '_' || c == '$');
        if word.is_empty() {
            continue;
        }

        let whole = word.to_lowercase();
        let parts = identifier_parts(word);
        if whole.chars().count() >= MIN_TOKEN_CHARS {
            tokens.push(whole.clone());
        }
        if parts.len() > 1 {
            tokens.extend(
                parts
                    .into_iter()
                    .filter(|p| p.chars().count() >= MIN_TOKEN_CHARS && *p != whole),
            );
        }
    }

    tokens
}

/// Split an identifier on `_`, `$` and lower→upper / digit boundaries.
///
/// `parseHTTPResponse` becomes `["parse", "http", "response"]`.
pub fn identifier_parts(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let mut parts = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '$' {
            if !current.is_empty() {
                parts.push(std::mem::take(&mut current).to_lowercase());
            }
            continue;
        }

        let boundary = match current.chars().last() {
            Some(prev) => {
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                (prev.is_lowercase() && c.is_uppercase())
                    || (prev.is_uppercase() && c.is_uppercase() && next_is_lower)
                    || (prev.is_ascii_digit() != c.is_ascii_digit())
            }
            None => false,
        };

        if boundary {
            parts.push(std::mem::take(&mut current).to_lowercase());
        }
        current.push(c);
    }

    if !current.is_empty() {
        parts.push(current.to_lowercase());
    }

    parts
}
