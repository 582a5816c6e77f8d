//! The documentation chunk model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docent_embeddings::Embedding;

/// Heading given to content that precedes the first markdown heading.
pub const INTRODUCTION_HEADING: &str = "Introduction";

/// A single heading-delimited documentation section.
///
/// Chunks are created in one pass over one file and replaced wholesale when
/// that file is re-indexed; they are never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentationChunk {
    /// Unique identifier, derived from the file path and heading.
    pub id: String,

    /// Workspace-relative path of the markdown file.
    pub file_path: String,

    /// Heading text at the point the chunk begins.
    pub section_heading: String,

    /// Trimmed text between this heading and the next one.
    pub content: String,

    /// Embedding vector, populated before storage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Embedding>,

    /// Metadata about the chunk.
    pub metadata: ChunkMetadata,
}

impl DocumentationChunk {
    /// Create a chunk, computing its word count from `content`.
    pub fn new(
        id: impl Into<String>,
        file_path: impl Into<String>,
        section_heading: impl Into<String>,
        content: impl Into<String>,
        level: u8,
        last_modified: DateTime<Utc>,
    ) -> Self {
        let content = content.into();
        let word_count = word_count(&content);
        Self {
            id: id.into(),
            file_path: file_path.into(),
            section_heading: section_heading.into(),
            content,
            embedding: None,
            metadata: ChunkMetadata {
                level: level.clamp(1, 6),
                word_count,
                last_modified,
            },
        }
    }

    /// Attach an embedding.
    pub fn with_embedding(mut self, embedding: Embedding) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Whether this is the synthetic section preceding the first heading.
    pub fn is_introduction(&self) -> bool {
        self.section_heading == INTRODUCTION_HEADING
    }

    /// Text used to embed this chunk: heading followed by content.
    pub fn embedding_text(&self) -> String {
        if self.content.is_empty() {
            self.section_heading.clone()
        } else {
            format!("{}\n{}", self.section_heading, self.content)
        }
    }
}

/// Metadata about a chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    /// Heading level (1-6).
    pub level: u8,

    /// Whitespace-separated word count of the content.
    pub word_count: usize,

    /// Modification time of the source file.
    pub last_modified: DateTime<Utc>,
}

/// Count whitespace-separated words, ignoring empty tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_word_count_matches_content() {
        let chunk = DocumentationChunk::new(
            "readme-md-usage",
            "README.md",
            "Usage",
            "Run   the\n tool  twice",
            2,
            Utc::now(),
        );
        assert_eq!(chunk.metadata.word_count, 4);
        assert_eq!(chunk.metadata.level, 2);
    }

    #[test]
    fn test_serializes_camel_case() {
        let chunk = DocumentationChunk::new("id", "docs/a.md", "A", "", 1, Utc::now());
        let json = serde_json::to_value(&chunk).unwrap();
        assert!(json.get("filePath").is_some());
        assert!(json.get("sectionHeading").is_some());
        assert!(json["metadata"].get("wordCount").is_some());
        assert!(json.get("embedding").is_none());
    }
}
