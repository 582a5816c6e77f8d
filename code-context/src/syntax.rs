//! Tree-sitter symbol lookup for JavaScript and TypeScript.

use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Parser, Query, QueryCursor};

use crate::error::{CodeContextError, Result};

/// The function and class a selection belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolScope {
    pub function_name: Option<String>,
    pub class_name: Option<String>,
}

impl SymbolScope {
    /// Whether neither name was found.
    pub fn is_empty(&self) -> bool {
        self.function_name.is_none() && self.class_name.is_none()
    }
}

const JAVASCRIPT_QUERY: &str = r#"
(function_declaration name: (_) @name) @function
(generator_function_declaration name: (_) @name) @function
(method_definition name: (_) @name) @function
(variable_declarator name: (identifier) @name value: (arrow_function)) @function
(variable_declarator name: (identifier) @name value: (function_expression)) @function
(class_declaration name: (_) @name) @class
"#;

const TYPESCRIPT_QUERY: &str = r#"
(function_declaration name: (_) @name) @function
(generator_function_declaration name: (_) @name) @function
(method_definition name: (_) @name) @function
(variable_declarator name: (identifier) @name value: (arrow_function)) @function
(variable_declarator name: (identifier) @name value: (function_expression)) @function
(class_declaration name: (_) @name) @class
(abstract_class_declaration name: (_) @name) @class
"#;

fn language_config(language_id: &str) -> Result<(Language, &'static str)> {
    match language_id {
        "javascript" | "javascriptreact" => {
            Ok((tree_sitter_javascript::LANGUAGE.into(), JAVASCRIPT_QUERY))
        }
        "typescript" => Ok((
            tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            TYPESCRIPT_QUERY,
        )),
        "typescriptreact" => Ok((tree_sitter_typescript::LANGUAGE_TSX.into(), TYPESCRIPT_QUERY)),
        other => Err(CodeContextError::UnsupportedLanguage(other.to_string())),
    }
}

/// A named definition and its byte span.
struct Definition<'a> {
    name: &'a str,
    is_class: bool,
    start: usize,
    end: usize,
}

/// Find the innermost function and class enclosing `start..end`.
///
/// When no definition encloses the range, the first definition starting
/// inside it is used instead, so selecting a whole function names it. Any
/// parse error fails the call so the caller can fall back to regexes.
pub fn enclosing_symbols(
    source: &str,
    language_id: &str,
    start: usize,
    end: usize,
) -> Result<SymbolScope> {
    let (language, query_source) = language_config(language_id)?;

    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| CodeContextError::Parse(e.to_string()))?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| CodeContextError::Parse("parser returned no tree".to_string()))?;
    if tree.root_node().has_error() {
        return Err(CodeContextError::Parse(format!(
            "syntax errors in {language_id} source"
        )));
    }

    let query =
        Query::new(&language, query_source).map_err(|e| CodeContextError::Query(e.to_string()))?;
    let name_idx = query
        .capture_index_for_name("name")
        .ok_or_else(|| CodeContextError::Query("missing @name capture".to_string()))?;
    let function_idx = query.capture_index_for_name("function");
    let class_idx = query.capture_index_for_name("class");

    let mut definitions = Vec::new();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, tree.root_node(), source.as_bytes());
    while let Some(m) = matches.next() {
        let mut name = None;
        let mut span = None;
        for capture in m.captures {
            if capture.index == name_idx {
                name = source.get(capture.node.start_byte()..capture.node.end_byte());
            } else if Some(capture.index) == function_idx || Some(capture.index) == class_idx {
                span = Some((
                    Some(capture.index) == class_idx,
                    capture.node.start_byte(),
                    capture.node.end_byte(),
                ));
            }
        }
        if let (Some(name), Some((is_class, start, end))) = (name, span) {
            definitions.push(Definition {
                name,
                is_class,
                start,
                end,
            });
        }
    }

    Ok(SymbolScope {
        function_name: pick(&definitions, false, start, end),
        class_name: pick(&definitions, true, start, end),
    })
}

fn pick(
    definitions: &[Definition<'_>],
    is_class: bool,
    start: usize,
    end: usize,
) -> Option<String> {
    let kind = || definitions.iter().filter(move |d| d.is_class == is_class);

    let enclosing = kind()
        .filter(|d| d.start <= start && end <= d.end)
        .min_by_key(|d| d.end - d.start);
    let inside = || {
        kind()
            .filter(|d| start <= d.start && d.start < end)
            .min_by_key(|d| d.start)
    };

    enclosing.or_else(inside).map(|d| d.name.to_string())
}
