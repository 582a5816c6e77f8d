//! Reading markdown files from disk into chunks.

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::debug;

use crate::chunk::DocumentationChunk;
use crate::chunker::{IdGenerator, MarkdownChunker, strip_frontmatter};
use crate::error::{DocIndexError, Result};

/// Whether a path has a `.md` extension, compared case-insensitively.
pub fn is_markdown_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

/// Express `path` relative to `root` with `/` separators.
///
/// Paths outside `root` are returned as given.
pub fn relative_path(path: &Path, root: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => match part.to_str() {
                Some(part) => parts.push(part),
                None => {
                    return Err(DocIndexError::InvalidPath(
                        relative.display().to_string(),
                    ));
                }
            },
            Component::CurDir => {}
            _ => return Ok(relative.display().to_string()),
        }
    }
    Ok(parts.join("/"))
}

/// A markdown file read from disk, not yet chunked.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,

    /// Workspace-relative path with `/` separators.
    pub file_path: String,

    pub content: String,
    pub last_modified: DateTime<Utc>,
}

/// Turns markdown files into documentation chunks.
#[derive(Debug, Clone)]
pub struct DocumentProcessor {
    chunker: MarkdownChunker,
    strip_frontmatter: bool,
}

impl DocumentProcessor {
    /// Create a processor with the default chunker and frontmatter stripping.
    pub fn new() -> Self {
        Self {
            chunker: MarkdownChunker::new(),
            strip_frontmatter: true,
        }
    }

    /// Use a specific chunker.
    pub fn with_chunker(mut self, chunker: MarkdownChunker) -> Self {
        self.chunker = chunker;
        self
    }

    /// Set whether a leading YAML frontmatter block is removed before chunking.
    pub fn with_strip_frontmatter(mut self, strip: bool) -> Self {
        self.strip_frontmatter = strip;
        self
    }

    /// Read and chunk one markdown file.
    ///
    /// Chunk paths are relative to `workspace_root`. Checks run in order:
    /// the path must exist, must be a regular file, and must end in `.md`.
    pub async fn process_file(
        &self,
        path: &Path,
        workspace_root: &Path,
    ) -> Result<Vec<DocumentationChunk>> {
        let source = self.read_file(path, workspace_root).await?;
        Ok(self.chunk_source(&source, &mut IdGenerator::new()))
    }

    /// Validate and read one markdown file without chunking it.
    pub async fn read_file(&self, path: &Path, workspace_root: &Path) -> Result<SourceFile> {
        let metadata = match fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DocIndexError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        if !metadata.is_file() {
            return Err(DocIndexError::NotAFile(path.to_path_buf()));
        }

        if !is_markdown_path(path) {
            return Err(DocIndexError::UnsupportedFileType(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).await?;
        let last_modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(SourceFile {
            path: path.to_path_buf(),
            file_path: relative_path(path, workspace_root)?,
            content,
            last_modified,
        })
    }

    /// Chunk a file read by [`Self::read_file`].
    pub fn chunk_source(
        &self,
        source: &SourceFile,
        ids: &mut IdGenerator,
    ) -> Vec<DocumentationChunk> {
        let body = if self.strip_frontmatter {
            strip_frontmatter(&source.content)
        } else {
            &source.content
        };

        let chunks = self
            .chunker
            .split_with_ids(body, &source.file_path, source.last_modified, ids);
        debug!("Processed {}: {} chunks", source.file_path, chunks.len());
        chunks
    }
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_is_markdown_path() {
        assert!(is_markdown_path(Path::new("README.md")));
        assert!(is_markdown_path(Path::new("docs/GUIDE.MD")));
        assert!(is_markdown_path(Path::new("notes.Md")));
        assert!(!is_markdown_path(Path::new("notes.txt")));
        assert!(!is_markdown_path(Path::new("markdown")));
        assert!(!is_markdown_path(Path::new("page.mdx")));
    }

    #[test]
    fn test_relative_path() {
        let root = Path::new("/work");
        assert_eq!(
            relative_path(Path::new("/work/docs/api/sum.md"), root).unwrap(),
            "docs/api/sum.md"
        );
        assert_eq!(relative_path(Path::new("README.md"), root).unwrap(), "README.md");
    }

    #[tokio::test]
    async fn test_process_file_chunks_markdown() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        let path = dir.path().join("docs").join("math.MD");
        std::fs::write(&path, "---\ntitle: Math\n---\n# Math\n## add\nAdds numbers.").unwrap();

        let chunks = DocumentProcessor::new()
            .process_file(&path, dir.path())
            .await
            .unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].file_path, "docs/math.MD");
        assert_eq!(chunks[1].section_heading, "add");
        assert_eq!(chunks[1].content, "Adds numbers.");
    }

    #[tokio::test]
    async fn test_frontmatter_kept_when_disabled() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.md");
        std::fs::write(&path, "---\ntitle: A\n---\n# A\nbody").unwrap();

        let chunks = DocumentProcessor::new()
            .with_strip_frontmatter(false)
            .process_file(&path, dir.path())
            .await
            .unwrap();

        assert!(chunks[0].is_introduction());
        assert!(chunks[0].content.contains("title: A"));
    }

    #[tokio::test]
    async fn test_rejects_non_markdown() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "# Title").unwrap();

        let err = DocumentProcessor::new()
            .process_file(&path, dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, DocIndexError::UnsupportedFileType(_)));
        assert!(err.to_string().contains("Only .md files are supported"));
    }

    #[tokio::test]
    async fn test_missing_and_directory_errors_are_distinct() {
        let dir = TempDir::new().unwrap();
        let processor = DocumentProcessor::new();

        let missing = processor
            .process_file(&dir.path().join("missing.md"), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(missing, DocIndexError::NotFound(_)));

        let folder = dir.path().join("folder.md");
        std::fs::create_dir(&folder).unwrap();
        let not_file = processor.process_file(&folder, dir.path()).await.unwrap_err();
        assert!(matches!(not_file, DocIndexError::NotAFile(_)));

        assert_ne!(missing.to_string(), not_file.to_string());
    }
}
