//! Deterministic digests of a [`CodeContext`].

use sha2::{Digest, Sha256};

use docent_code_context::CodeContext;

/// Digest of every context field, used for in-flight deduplication.
///
/// Imports are sorted first so their order does not change the hash.
pub fn context_hash(context: &CodeContext) -> String {
    let mut imports: Vec<&str> = context.imports.iter().map(String::as_str).collect();
    imports.sort_unstable();

    let mut hasher = Sha256::new();
    update_field(&mut hasher, "selectedText", &context.selected_text);
    update_field(&mut hasher, "fileName", &context.file_name);
    update_field(&mut hasher, "language", &context.language);
    update_optional(&mut hasher, "functionName", context.function_name.as_deref());
    update_optional(&mut hasher, "className", context.class_name.as_deref());
    hasher.update((imports.len() as u64).to_le_bytes());
    for import in imports {
        update_field(&mut hasher, "import", import);
    }
    update_field(&mut hasher, "surroundingContext", &context.surrounding_context);
    to_hex(&hasher.finalize())
}

/// Digest of file name, function name, class name and selected text.
///
/// Narrower than [`context_hash`]: contexts that differ only in imports,
/// surrounding lines or language share a cache entry.
pub fn cache_key(context: &CodeContext) -> String {
    let mut hasher = Sha256::new();
    update_field(&mut hasher, "fileName", &context.file_name);
    update_optional(&mut hasher, "functionName", context.function_name.as_deref());
    update_optional(&mut hasher, "className", context.class_name.as_deref());
    update_field(&mut hasher, "selectedText", &context.selected_text);
    to_hex(&hasher.finalize())
}

/// Length-prefix every field so adjacent values cannot run together.
fn update_field(hasher: &mut Sha256, name: &str, value: &str) {
    hasher.update(name.as_bytes());
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn update_optional(hasher: &mut Sha256, name: &str, value: Option<&str>) {
    match value {
        Some(value) => {
            hasher.update([1u8]);
            update_field(hasher, name, value);
        }
        None => hasher.update([0u8]),
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn context() -> CodeContext {
        CodeContext::new("return a + b;", "src/calc.js", "javascript")
            .with_function_name("calculateSum")
            .with_imports(vec!["lodash".to_string(), "react".to_string()])
            .with_surrounding_context("function calculateSum(a, b) {")
    }

    #[test]
    fn test_hash_is_stable_hex() {
        let hash = context_hash(&context());
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, context_hash(&context()));
    }

    #[test]
    fn test_import_order_ignored() {
        let reordered =
            context().with_imports(vec!["react".to_string(), "lodash".to_string()]);
        assert_eq!(context_hash(&context()), context_hash(&reordered));
    }

    #[test]
    fn test_context_hash_covers_all_fields() {
        let base = context_hash(&context());
        assert_ne!(base, context_hash(&context().with_surrounding_context("other")));
        assert_ne!(base, context_hash(&context().with_class_name("Calculator")));
        assert_ne!(base, context_hash(&context().with_imports(Vec::new())));
    }

    #[test]
    fn test_cache_key_is_narrower() {
        let base = cache_key(&context());
        let mut other = context().with_surrounding_context("other").with_imports(Vec::new());
        other.language = "typescript".to_string();
        assert_eq!(base, cache_key(&other));

        other.selected_text = "return a - b;".to_string();
        assert_ne!(base, cache_key(&other));
    }

    #[test]
    fn test_missing_and_empty_names_differ() {
        let mut empty_name = context();
        empty_name.function_name = Some(String::new());
        let mut no_name = context();
        no_name.function_name = None;
        assert_ne!(cache_key(&empty_name), cache_key(&no_name));
    }
}
