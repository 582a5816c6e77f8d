//! Import and require target extraction.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex_lite::Regex;

const IMPORT_PATTERNS: &[&str] = &[
    // import x from 'a'; import { x } from "a"; export * from 'a'
    r#"(?m)^\s*(?:import|export)\s[^'";]*?\bfrom\s*['"]([^'"]+)['"]"#,
    // import 'a';
    r#"(?m)^\s*import\s*['"]([^'"]+)['"]"#,
    // require('a')
    r#"\brequire\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
    // import('a')
    r#"\bimport\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
];

static IMPORT_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| compile_patterns(IMPORT_PATTERNS));

/// Path prefixes that never identify project documentation.
const VENDOR_PREFIXES: &[&str] = &["node_modules", "vendor"];

/// Extract import targets in order of appearance, without duplicates.
pub fn extract_imports(source: &str) -> Vec<String> {
    let mut found: Vec<(usize, &str)> = Vec::new();

    for re in IMPORT_REGEXES.iter() {
        for cap in re.captures_iter(source) {
            if let Some(target) = cap.get(1) {
                found.push((target.start(), target.as_str()));
            }
        }
    }

    found.sort_by_key(|(pos, _)| *pos);

    let mut seen = HashSet::new();
    found
        .into_iter()
        .map(|(_, target)| target.trim())
        .filter(|target| !target.is_empty() && seen.insert(*target))
        .map(str::to_string)
        .collect()
}

/// Compile constant patterns. A bad pattern is a programming error, caught
/// by the first test that touches the static holding it.
#[allow(clippy::expect_used)]
pub(crate) fn compile_patterns(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|pattern| Regex::new(pattern).expect("constant pattern compiles"))
        .collect()
}

/// Whether an import names a relative file or a vendored dependency path.
pub fn is_local_or_vendor(target: &str) -> bool {
    target.starts_with("./")
        || target.starts_with("../")
        || target.starts_with('/')
        || target == "."
        || target == ".."
        || VENDOR_PREFIXES
            .iter()
            .any(|prefix| target == *prefix || target.starts_with(&format!("{prefix}/")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_all_forms_in_order() {
        let source = r#"import React, { useState } from 'react';
import './styles.css';
const path = require("path");
import {
  format,
  parse,
} from "date-fns";
async function lazy() { return import('./lazy.js'); }
const again = require('react');
"#;
        assert_eq!(
            extract_imports(source),
            vec!["react", "./styles.css", "path", "date-fns", "./lazy.js"]
        );
    }

    #[test]
    fn test_every_pattern_compiles() {
        assert_eq!(IMPORT_REGEXES.len(), IMPORT_PATTERNS.len());
    }

    #[test]
    fn test_no_imports() {
        assert!(extract_imports("function a() { return 1; }").is_empty());
    }

    #[test]
    fn test_local_or_vendor() {
        assert!(is_local_or_vendor("./util"));
        assert!(is_local_or_vendor("../lib/x"));
        assert!(is_local_or_vendor("/abs/path"));
        assert!(is_local_or_vendor("node_modules/lodash"));
        assert!(is_local_or_vendor("vendor/jquery"));
        assert!(!is_local_or_vendor("lodash"));
        assert!(!is_local_or_vendor("@scope/pkg"));
        assert!(!is_local_or_vendor("vendored-lib"));
    }
}
