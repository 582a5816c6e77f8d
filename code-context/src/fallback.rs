//! Regex symbol lookup, used when the source does not parse.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::imports::compile_patterns;
use crate::syntax::SymbolScope;

const FUNCTION_PATTERNS: &[&str] = &[
    r"(?:async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)\s*\(",
    r"(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*=\s*(?:async\s+)?(?:function\b|\([^)]*\)\s*=>|[A-Za-z_$][\w$]*\s*=>)",
    r"(?m)^\s*(?:(?:public|private|protected|static|async|readonly)\s+)*([A-Za-z_$][\w$]*)\s*\([^)]*\)\s*(?::\s*[^{;]+)?\{",
];

const CLASS_PATTERNS: &[&str] = &[r"\bclass\s+([A-Za-z_$][\w$]*)"];

static FUNCTION_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| compile_patterns(FUNCTION_PATTERNS));
static CLASS_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| compile_patterns(CLASS_PATTERNS));

/// Control-flow keywords the method pattern would otherwise accept.
const NOT_NAMES: &[&str] = &[
    "if", "for", "while", "switch", "catch", "function", "return", "with", "constructor",
];

/// Look for names in the selection first, then in the lines above it.
///
/// Within the selection the earliest definition wins; above it the nearest
/// (last) one does.
pub fn symbols_from_text(selected: &str, preceding: &str) -> SymbolScope {
    SymbolScope {
        function_name: find_name(selected, &FUNCTION_REGEXES, Pick::First)
            .or_else(|| find_name(preceding, &FUNCTION_REGEXES, Pick::Last)),
        class_name: find_name(selected, &CLASS_REGEXES, Pick::First)
            .or_else(|| find_name(preceding, &CLASS_REGEXES, Pick::Last)),
    }
}

#[derive(Clone, Copy)]
enum Pick {
    First,
    Last,
}

fn find_name(text: &str, regexes: &[Regex], pick: Pick) -> Option<String> {
    let mut found: Vec<(usize, &str)> = Vec::new();

    for re in regexes {
        for cap in re.captures_iter(text) {
            if let Some(name) = cap.get(1) {
                if !NOT_NAMES.contains(&name.as_str()) {
                    found.push((name.start(), name.as_str()));
                }
            }
        }
    }

    let chosen = match pick {
        Pick::First => found.into_iter().min_by_key(|(pos, _)| *pos),
        Pick::Last => found.into_iter().max_by_key(|(pos, _)| *pos),
    };
    chosen.map(|(_, name)| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_pattern_compiles() {
        assert_eq!(FUNCTION_REGEXES.len(), FUNCTION_PATTERNS.len());
        assert_eq!(CLASS_REGEXES.len(), CLASS_PATTERNS.len());
    }

    #[test]
    fn test_function_in_selection() {
        let scope = symbols_from_text("function calculateSum(a,b){return a+b;}", "");
        assert_eq!(scope.function_name.as_deref(), Some("calculateSum"));
        assert_eq!(scope.class_name, None);
    }

    #[test]
    fn test_arrow_and_async() {
        let scope = symbols_from_text("export const load = async (url) => fetch(url)", "");
        assert_eq!(scope.function_name.as_deref(), Some("load"));

        let scope = symbols_from_text("const inc = x => x + 1;", "");
        assert_eq!(scope.function_name.as_deref(), Some("inc"));
    }

    #[test]
    fn test_nearest_definition_above_selection() {
        let preceding = "class Cart {\n  total(items) {\n    if (items) {\n";
        let scope = symbols_from_text("return items.length;", preceding);
        assert_eq!(scope.function_name.as_deref(), Some("total"));
        assert_eq!(scope.class_name.as_deref(), Some("Cart"));
    }

    #[test]
    fn test_nothing_found() {
        assert!(symbols_from_text("a + b", "let x = 1;").is_empty());
    }
}
