//! # Code Context
//!
//! Captures what a user selected in a JavaScript or TypeScript file and turns
//! it into a documentation search query.
//!
//! ## Features
//!
//! - **Symbol Lookup**: Tree-sitter finds the enclosing function and class;
//!   a regex matcher takes over when the source does not parse
//! - **Imports**: ES imports, `require()` and dynamic `import()` targets
//! - **Query Building**: Symbol names lead the query so they dominate
//!   token overlap
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Code Context                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  TextDocument + Selection ──► ContextBuilder ──► CodeContext    │
//! │                                 │                     │         │
//! │                 syntax (tree-sitter)                  ▼         │
//! │                   └─► fallback (regex)       build_query_string │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod builder;
pub mod context;
pub mod document;
pub mod error;
pub mod fallback;
pub mod imports;
pub mod syntax;

pub use builder::ContextBuilder;
pub use context::{CodeContext, language_for_file};
pub use document::{Position, Selection, TextDocument};
pub use error::{CodeContextError, Result};
pub use imports::{extract_imports, is_local_or_vendor};
pub use syntax::SymbolScope;
