//! # Doc Index
//!
//! Turns project markdown into heading-delimited documentation chunks.
//!
//! ## Features
//!
//! - **Chunking**: One chunk per ATX heading, with an implicit
//!   "Introduction" chunk for leading prose
//! - **Stable IDs**: Derived from file path and heading, unique per pass
//! - **File Filter**: Only `.md` files (any case) are accepted
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Doc Index                                 │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  path ──► DocumentProcessor ──► MarkdownChunker ──► Vec<Chunk>  │
//! │               │                      │                          │
//! │               ▼                      ▼                          │
//! │     strip_frontmatter           IdGenerator                     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod chunk;
pub mod chunker;
pub mod error;
pub mod file;

pub use chunk::{ChunkMetadata, DocumentationChunk, INTRODUCTION_HEADING, word_count};
pub use chunker::{
    ChunkerConfig, IdGenerator, MarkdownChunker, drop_empty_chunks, parse_heading, slugify,
    strip_frontmatter,
};
pub use error::{DocIndexError, Result};
pub use file::{DocumentProcessor, SourceFile, is_markdown_path, relative_path};
