//! Heading-delimited markdown chunking.
//!
//! A document is split at every ATX heading (`#` through `######` followed by
//! whitespace and text). Each heading starts a new chunk that runs until the
//! next heading of any level. Text before the first heading becomes an
//! "Introduction" chunk, but only when it contains a non-blank line.
//!
//! Chunk IDs are derived from `file_path#heading`: lowercased, runs of
//! non-alphanumerics collapsed to `-`, trimmed of `-`. Repeated headings in
//! one file get `-1`, `-2`, … suffixes.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::chunk::{DocumentationChunk, INTRODUCTION_HEADING};

/// ID used when a file path and heading contain no alphanumerics at all.
const UNNAMED_SECTION_ID: &str = "unnamed-section";

/// Configuration for the chunker.
#[derive(Debug, Clone, Default)]
pub struct ChunkerConfig {
    /// Treat `#` lines inside fenced code blocks as content, not headings.
    pub respect_code_fences: bool,
}

/// Markdown chunker.
#[derive(Debug, Clone, Default)]
pub struct MarkdownChunker {
    config: ChunkerConfig,
}

/// A chunk under construction.
struct OpenChunk {
    heading: String,
    level: u8,
    lines: Vec<String>,
}

impl MarkdownChunker {
    /// Create a new chunker with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a chunker with custom configuration.
    pub fn with_config(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Split markdown content into chunks stamped with the current time.
    pub fn split(&self, content: &str, file_path: &str) -> Vec<DocumentationChunk> {
        self.split_at(content, file_path, Utc::now())
    }

    /// Split markdown content into chunks with an explicit modification time.
    ///
    /// Every chunk is emitted, including empty ones; use
    /// [`drop_empty_chunks`] to filter them explicitly.
    pub fn split_at(
        &self,
        content: &str,
        file_path: &str,
        last_modified: DateTime<Utc>,
    ) -> Vec<DocumentationChunk> {
        self.split_with_ids(content, file_path, last_modified, &mut IdGenerator::new())
    }

    /// Split markdown content, drawing chunk IDs from a shared generator.
    ///
    /// Sharing one generator across files keeps IDs unique for a whole
    /// indexing pass.
    pub fn split_with_ids(
        &self,
        content: &str,
        file_path: &str,
        last_modified: DateTime<Utc>,
        ids: &mut IdGenerator,
    ) -> Vec<DocumentationChunk> {
        let mut chunks = Vec::new();
        let mut current: Option<OpenChunk> = None;
        let mut in_fence = false;

        for line in content.lines() {
            if self.config.respect_code_fences && is_fence(line) {
                in_fence = !in_fence;
            }

            let heading = if in_fence { None } else { parse_heading(line) };
            match heading {
                Some((_, text)) if text.is_empty() => {
                    // Blank heading: skip it, keep filling the current chunk.
                }
                Some((level, text)) => {
                    if let Some(open) = current.take() {
                        chunks.push(close(open, file_path, last_modified, ids));
                    }
                    current = Some(OpenChunk {
                        heading: text.to_string(),
                        level,
                        lines: Vec::new(),
                    });
                }
                None => match current.as_mut() {
                    Some(open) => open.lines.push(line.to_string()),
                    None if !line.trim().is_empty() => {
                        current = Some(OpenChunk {
                            heading: INTRODUCTION_HEADING.to_string(),
                            level: 1,
                            lines: vec![line.to_string()],
                        });
                    }
                    None => {}
                },
            }
        }

        if let Some(open) = current.take() {
            chunks.push(close(open, file_path, last_modified, ids));
        }

        debug!("Split {file_path} into {} chunks", chunks.len());
        chunks
    }
}

/// Remove chunks with empty content, keeping any Introduction chunk.
pub fn drop_empty_chunks(chunks: Vec<DocumentationChunk>) -> Vec<DocumentationChunk> {
    chunks
        .into_iter()
        .filter(|c| !c.content.is_empty() || c.is_introduction())
        .collect()
}

/// Strip a leading YAML frontmatter block (`---` … `---`).
///
/// Content without a closed frontmatter block is returned unchanged.
pub fn strip_frontmatter(content: &str) -> &str {
    let Some(rest) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return content;
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        offset += line.len();
        let marker = line.trim_end_matches(['\r', '\n']);
        if marker == "---" || marker == "..." {
            return &rest[offset..];
        }
    }

    content
}

/// Match `^(#{1,6})\s+(.+)$`, returning the level and trimmed heading text.
///
/// A heading whose text is only whitespace returns an empty string so the
/// caller can skip it.
pub fn parse_heading(line: &str) -> Option<(u8, &str)> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }

    let rest = &line[hashes..];
    let mut chars = rest.chars();
    let first = chars.next()?;
    if !first.is_whitespace() || chars.next().is_none() {
        return None;
    }

    Some((hashes as u8, rest.trim()))
}

fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

fn close(
    open: OpenChunk,
    file_path: &str,
    last_modified: DateTime<Utc>,
    ids: &mut IdGenerator,
) -> DocumentationChunk {
    let content = open.lines.join("\n").trim().to_string();
    let id = ids.next_id(file_path, &open.heading);
    DocumentationChunk::new(id, file_path, open.heading, content, open.level, last_modified)
}

/// Produces IDs that are unique within one indexing pass.
#[derive(Debug, Default)]
pub struct IdGenerator {
    used: HashSet<String>,
}

impl IdGenerator {
    /// Create a generator with no reserved IDs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a generator that will never hand out any of `ids`.
    pub fn with_reserved<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            used: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Derive a unique ID for a heading in a file.
    pub fn next_id(&mut self, file_path: &str, heading: &str) -> String {
        let base = slugify(&format!("{file_path}#{heading}"));
        let mut candidate = base.clone();
        let mut suffix = 1;
        while self.used.contains(&candidate) {
            candidate = format!("{base}-{suffix}");
            suffix += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

/// Lowercase and collapse non-alphanumeric runs into single hyphens.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        UNNAMED_SECTION_ID.to_string()
    } else {
        slug
    }
}
