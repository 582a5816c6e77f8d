//! Building a [`CodeContext`] and its retrieval query from a selection.

use tracing::{debug, warn};

use crate::context::CodeContext;
use crate::document::{Selection, TextDocument};
use crate::error::{CodeContextError, Result};
use crate::fallback::symbols_from_text;
use crate::imports::{extract_imports, is_local_or_vendor};
use crate::syntax::{SymbolScope, enclosing_symbols};

/// Lines of context captured before and after a selection.
pub const DEFAULT_SURROUNDING_LINES: usize = 5;

/// Imports included in a retrieval query.
pub const DEFAULT_MAX_QUERY_IMPORTS: usize = 3;

/// Selections shorter than this (in chars) add surrounding context to the query.
pub const DEFAULT_SHORT_SELECTION_CHARS: usize = 100;

/// Extracts code context from documents and builds retrieval queries.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    surrounding_lines: usize,
    max_query_imports: usize,
    short_selection_chars: usize,
}

impl ContextBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self {
            surrounding_lines: DEFAULT_SURROUNDING_LINES,
            max_query_imports: DEFAULT_MAX_QUERY_IMPORTS,
            short_selection_chars: DEFAULT_SHORT_SELECTION_CHARS,
        }
    }

    /// Set the number of surrounding lines on each side.
    pub fn with_surrounding_lines(mut self, lines: usize) -> Self {
        self.surrounding_lines = lines;
        self
    }

    /// Capture the context of a selection.
    ///
    /// Never fails: positions are clamped, reversed selections are swapped,
    /// and any internal failure yields [`CodeContext::empty`].
    pub fn extract(&self, document: &TextDocument, selection: Selection) -> CodeContext {
        match self.try_extract(document, selection) {
            Ok(context) => context,
            Err(e) => {
                warn!("Context extraction failed for {}: {e}", document.file_name);
                CodeContext::empty(&document.file_name, &document.language_id)
            }
        }
    }

    fn try_extract(&self, document: &TextDocument, selection: Selection) -> Result<CodeContext> {
        let selection = Selection::new(
            document.clamp(selection.start),
            document.clamp(selection.end),
        )
        .ordered();

        let start = document.offset_at(selection.start);
        let end = document.offset_at(selection.end);
        let selected_text = document
            .text
            .get(start..end)
            .ok_or(CodeContextError::InvalidRange { start, end })?;
        let preceding = document
            .text
            .get(..start)
            .ok_or(CodeContextError::InvalidRange { start: 0, end: start })?;

        let scope = symbol_scope(document, selected_text, preceding, start, end);

        Ok(CodeContext {
            selected_text: selected_text.to_string(),
            file_name: document.file_name.clone(),
            language: document.language_id.clone(),
            function_name: scope.function_name,
            class_name: scope.class_name,
            imports: extract_imports(&document.text),
            surrounding_context: self.surrounding(document, selection),
        })
    }

    fn surrounding(&self, document: &TextDocument, selection: Selection) -> String {
        let ranges = document.line_ranges();
        let last = ranges.len().saturating_sub(1);
        let first_line = selection.start.line.saturating_sub(self.surrounding_lines);
        let last_line = selection
            .end
            .line
            .saturating_add(self.surrounding_lines)
            .min(last);

        ranges
            .get(first_line..=last_line)
            .unwrap_or_default()
            .iter()
            .filter_map(|&(start, end)| document.text.get(start..end))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Build the similarity-search query for a context.
    ///
    /// Parts in priority order: trimmed selection, `function <name>`,
    /// `class <name>`, up to three package imports, and the surrounding
    /// lines when the selection is short.
    pub fn build_query_string(&self, context: &CodeContext) -> String {
        let selected = context.selected_text.trim();
        let mut parts: Vec<String> = Vec::new();

        if !selected.is_empty() {
            parts.push(selected.to_string());
        }
        if let Some(name) = &context.function_name {
            parts.push(format!("function {name}"));
        }
        if let Some(name) = &context.class_name {
            parts.push(format!("class {name}"));
        }

        let imports: Vec<&str> = context
            .imports
            .iter()
            .map(String::as_str)
            .filter(|target| !is_local_or_vendor(target))
            .take(self.max_query_imports)
            .collect();
        if !imports.is_empty() {
            parts.push(imports.join(" "));
        }

        let surrounding = context.surrounding_context.trim();
        if selected.chars().count() < self.short_selection_chars && !surrounding.is_empty() {
            parts.push(surrounding.to_string());
        }

        parts.join(" ")
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Structured lookup first; regex lookup over the text on any failure.
fn symbol_scope(
    document: &TextDocument,
    selected: &str,
    preceding: &str,
    start: usize,
    end: usize,
) -> SymbolScope {
    match enclosing_symbols(&document.text, &document.language_id, start, end) {
        Ok(scope) => scope,
        Err(e) => {
            debug!("Falling back to regex symbol lookup: {e}");
            symbols_from_text(selected, preceding)
        }
    }
}
