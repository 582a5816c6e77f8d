//! The code context model.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// One user-initiated explanation request, built from an editor selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeContext {
    /// The selected text, verbatim.
    pub selected_text: String,

    /// File the selection came from.
    #[serde(default)]
    pub file_name: String,

    /// Editor language id.
    #[serde(default)]
    pub language: String,

    /// Innermost enclosing function, if one was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,

    /// Innermost enclosing class, if one was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    /// Import and require targets in first-seen order, deduplicated.
    #[serde(default)]
    pub imports: Vec<String>,

    /// Lines around the selection.
    #[serde(default)]
    pub surrounding_context: String,
}

impl CodeContext {
    /// Create a context with only the selection and its origin.
    pub fn new(
        selected_text: impl Into<String>,
        file_name: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            selected_text: selected_text.into(),
            file_name: file_name.into(),
            language: language.into(),
            ..Default::default()
        }
    }

    /// The empty-but-valid context used when extraction fails.
    pub fn empty(file_name: impl Into<String>, language: impl Into<String>) -> Self {
        Self::new("", file_name, language)
    }

    /// Set the enclosing function name.
    pub fn with_function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = Some(name.into());
        self
    }

    /// Set the enclosing class name.
    pub fn with_class_name(mut self, name: impl Into<String>) -> Self {
        self.class_name = Some(name.into());
        self
    }

    /// Set the imports.
    pub fn with_imports(mut self, imports: Vec<String>) -> Self {
        self.imports = imports;
        self
    }

    /// Set the surrounding context.
    pub fn with_surrounding_context(mut self, context: impl Into<String>) -> Self {
        self.surrounding_context = context.into();
        self
    }

    /// Whether the selection has no non-whitespace text.
    pub fn is_blank(&self) -> bool {
        self.selected_text.trim().is_empty()
    }
}

/// Map a file name to an editor language id by extension.
///
/// Returns `plaintext` for anything that is not JavaScript or TypeScript.
pub fn language_for_file(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("js" | "mjs" | "cjs") => "javascript",
        Some("jsx") => "javascriptreact",
        Some("ts" | "mts" | "cts") => "typescript",
        Some("tsx") => "typescriptreact",
        _ => "plaintext",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_language_for_file() {
        assert_eq!(language_for_file("src/app.js"), "javascript");
        assert_eq!(language_for_file("src/App.TSX"), "typescriptreact");
        assert_eq!(language_for_file("lib/index.mts"), "typescript");
        assert_eq!(language_for_file("README.md"), "plaintext");
    }

    #[test]
    fn test_deserializes_with_defaults() {
        let context: CodeContext =
            serde_json::from_str(r#"{"selectedText": "a + b", "functionName": "add"}"#).unwrap();
        assert_eq!(context.selected_text, "a + b");
        assert_eq!(context.function_name.as_deref(), Some("add"));
        assert!(context.imports.is_empty());
        assert!(context.class_name.is_none());
    }

    #[test]
    fn test_missing_selected_text_is_rejected() {
        let result = serde_json::from_str::<CodeContext>(r#"{"fileName": "a.js"}"#);
        assert!(result.is_err());
    }
}
