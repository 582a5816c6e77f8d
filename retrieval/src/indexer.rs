//! Workspace documentation indexing.
//!
//! Scans the root `README.md` and everything under the docs directory,
//! chunks each markdown file and replaces that file's rows in the store.
//! Files are independent: one that fails to read or store is counted and
//! logged, and the pass continues.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use docent_doc_index::{
    ChunkerConfig, DocumentProcessor, IdGenerator, MarkdownChunker, SourceFile,
    drop_empty_chunks, is_markdown_path, relative_path,
};

use crate::engine::ExplanationEngine;
use crate::error::Result;

/// Counts from one indexing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexReport {
    pub files_indexed: usize,

    /// Non-markdown files found under the docs directory.
    pub files_skipped: usize,

    pub files_failed: usize,

    /// Files whose rows were removed because the file is gone.
    pub files_removed: usize,

    pub chunks_stored: usize,
    pub chunks_failed: usize,
    pub duration_ms: u64,
}

/// Indexes a workspace into an engine's store.
pub struct WorkspaceIndexer {
    engine: ExplanationEngine,
    workspace_root: PathBuf,
    processor: DocumentProcessor,
}

impl WorkspaceIndexer {
    pub fn new(engine: ExplanationEngine, workspace_root: impl Into<PathBuf>) -> Self {
        let index = &engine.config().index;
        let chunker = MarkdownChunker::with_config(ChunkerConfig {
            respect_code_fences: index.respect_code_fences,
        });
        let processor = DocumentProcessor::new()
            .with_chunker(chunker)
            .with_strip_frontmatter(index.strip_frontmatter);
        Self {
            engine,
            workspace_root: workspace_root.into(),
            processor,
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Index every documentation file in the workspace.
    pub async fn index_workspace(&self) -> Result<IndexReport> {
        let started = Instant::now();
        let store = self.engine.store();
        store.initialize().await?;

        let mut report = IndexReport::default();
        let (files, skipped) = self.discover();
        report.files_skipped = skipped;

        let mut sources = Vec::with_capacity(files.len());
        let mut unreadable = HashSet::new();
        for path in &files {
            match self.processor.read_file(path, &self.workspace_root).await {
                Ok(source) => sources.push(source),
                Err(e) => {
                    warn!("Failed to read {}: {e}", path.display());
                    report.files_failed += 1;
                    if let Ok(file_path) = relative_path(path, &self.workspace_root) {
                        unreadable.insert(file_path);
                    }
                }
            }
        }

        // Rows of unreadable files stay, so their IDs are taken.
        let mut ids = IdGenerator::with_reserved(store.ids_in_files(&unreadable).await?);
        let mut seen = unreadable;
        for source in &sources {
            seen.insert(source.file_path.clone());
            match self.index_source(source, &mut ids).await {
                Ok((stored, failed)) => {
                    report.files_indexed += 1;
                    report.chunks_stored += stored;
                    report.chunks_failed += failed;
                }
                Err(e) => {
                    warn!("Failed to index {}: {e}", source.path.display());
                    report.files_failed += 1;
                }
            }
        }

        for stale in store.file_paths().await? {
            if !seen.contains(&stale) {
                store.remove_file(&stale).await?;
                self.engine.on_file_reindexed(&stale).await;
                report.files_removed += 1;
                debug!("Removed rows for deleted file {stale}");
            }
        }

        report.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            "Indexed {} files ({} chunks) in {}ms; {} failed, {} skipped, {} removed",
            report.files_indexed,
            report.chunks_stored,
            report.duration_ms,
            report.files_failed,
            report.files_skipped,
            report.files_removed
        );
        Ok(report)
    }

    /// Re-index one file, e.g. after it was saved.
    ///
    /// Chunk IDs avoid every ID already held by other files.
    pub async fn index_file(&self, path: &Path) -> Result<IndexReport> {
        let started = Instant::now();
        let store = self.engine.store();
        store.initialize().await?;

        let path = self.absolute(path);
        let file_path = relative_path(&path, &self.workspace_root)?;
        let source = self.processor.read_file(&path, &self.workspace_root).await?;
        let mut ids = IdGenerator::with_reserved(store.ids_excluding_file(&file_path).await?);
        let (stored, failed) = self.index_source(&source, &mut ids).await?;

        Ok(IndexReport {
            files_indexed: 1,
            chunks_stored: stored,
            chunks_failed: failed,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            ..Default::default()
        })
    }

    /// Drop a deleted file's rows and the explanations citing it.
    pub async fn remove_file(&self, path: &Path) -> Result<usize> {
        let file_path = relative_path(&self.absolute(path), &self.workspace_root)?;
        let removed = self.engine.store().remove_file(&file_path).await?;
        self.engine.on_file_reindexed(&file_path).await;
        Ok(removed)
    }

    /// Chunk one read file and replace its rows. Returns the stored and
    /// failed chunk counts.
    async fn index_source(
        &self,
        source: &SourceFile,
        ids: &mut IdGenerator,
    ) -> Result<(usize, usize)> {
        let mut chunks = self.processor.chunk_source(source, ids);
        if self.engine.config().index.drop_empty_chunks {
            chunks = drop_empty_chunks(chunks);
        }

        let file_path = &source.file_path;
        let store = self.engine.store();
        store.remove_file(file_path).await?;

        let (stored, failed) = if chunks.is_empty() {
            (0, 0)
        } else {
            let report = store.store_chunks(chunks).await?;
            (report.stored, report.failed)
        };

        self.engine.on_file_reindexed(file_path).await;
        debug!("Indexed {file_path}: {stored} chunks stored, {failed} failed");
        Ok((stored, failed))
    }

    /// Markdown files to index in sorted order, plus the count of other
    /// files found under the docs directory.
    fn discover(&self) -> (Vec<PathBuf>, usize) {
        let index = &self.engine.config().index;
        let mut files = Vec::new();
        let mut skipped = 0;

        if index.include_readme {
            files.extend(find_readme(&self.workspace_root));
        }

        let docs_dir = self.workspace_root.join(&index.docs_dir);
        if docs_dir.is_dir() {
            for entry in WalkDir::new(&docs_dir)
                .follow_links(false)
                .into_iter()
                .flatten()
                .filter(|e| e.file_type().is_file())
            {
                if is_markdown_path(entry.path()) {
                    files.push(entry.into_path());
                } else {
                    debug!("Skipping non-markdown file {}", entry.path().display());
                    skipped += 1;
                }
            }
        } else {
            debug!("No docs directory at {}", docs_dir.display());
        }

        files.sort();
        files.dedup();
        (files, skipped)
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }
}

/// The root README with a `.md` extension in any case.
fn find_readme(root: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(root).ok()?;
    let mut candidates: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_markdown_path(p))
        .filter(|p| {
            p.file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|s| s.eq_ignore_ascii_case("readme"))
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DocentConfig, IndexConfig};
    use docent_code_context::CodeContext;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    async fn indexer(dir: &TempDir, config: DocentConfig) -> WorkspaceIndexer {
        let engine = ExplanationEngine::open(dir.path(), config).await.unwrap();
        WorkspaceIndexer::new(engine, dir.path())
    }

    #[tokio::test]
    async fn test_index_workspace() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "README.md",
            "# Project\nIntro text.\n## calculateSum\nAdds two numbers.\n",
        );
        write(dir.path(), "docs/guide.MD", "# Guide\nUsage notes.\n");
        write(dir.path(), "docs/nested/api.md", "# API\nEndpoints.\n");
        write(dir.path(), "docs/diagram.png", "binary");
        write(dir.path(), "notes.md", "# Not indexed\n");

        let indexer = indexer(&dir, DocentConfig::default()).await;
        let report = indexer.index_workspace().await.unwrap();

        assert_eq!(report.files_indexed, 3);
        assert_eq!(report.files_skipped, 1);
        assert_eq!(report.files_failed, 0);
        assert_eq!(report.chunks_stored, 4);
        assert_eq!(
            indexer.engine.store().file_paths().await.unwrap(),
            vec!["README.md", "docs/guide.MD", "docs/nested/api.md"]
        );
    }

    #[tokio::test]
    async fn test_reindex_replaces_and_removes() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md", "# A\none\n# B\ntwo\n");
        write(dir.path(), "docs/old.md", "# Old\ngone soon\n");

        let indexer = indexer(&dir, DocentConfig::default()).await;
        indexer.index_workspace().await.unwrap();
        assert_eq!(indexer.engine.store().len().await.unwrap(), 3);

        write(dir.path(), "README.md", "# A\none\n");
        std::fs::remove_file(dir.path().join("docs/old.md")).unwrap();
        let report = indexer.index_workspace().await.unwrap();

        assert_eq!(report.files_removed, 1);
        assert_eq!(indexer.engine.store().len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_index_file_keeps_ids_unique() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "docs/a.md", "# Setup\nfirst\n");
        write(dir.path(), "docs-a.md", "# Setup\nsecond\n");

        let indexer = indexer(&dir, DocentConfig::default()).await;
        indexer.index_workspace().await.unwrap();
        indexer.index_file(Path::new("docs-a.md")).await.unwrap();

        let store = indexer.engine.store();
        assert_eq!(store.len().await.unwrap(), 2);
        assert_eq!(
            store.get("docs-a-md-setup").await.unwrap().unwrap().file_path,
            "docs/a.md"
        );
    }

    #[tokio::test]
    async fn test_unreadable_file_keeps_its_ids() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "docs/docs/a.md", "# Setup\nkept rows\n");

        let indexer = indexer(&dir, DocentConfig::default()).await;
        indexer.index_workspace().await.unwrap();

        std::fs::write(dir.path().join("docs/docs/a.md"), [0xff, 0xfe, 0xfd]).unwrap();
        write(dir.path(), "docs/docs-a.md", "# Setup\nnew file\n");
        let report = indexer.index_workspace().await.unwrap();

        assert_eq!(report.files_failed, 1);
        assert_eq!(report.files_indexed, 1);
        let store = indexer.engine.store();
        assert_eq!(store.len().await.unwrap(), 2);
        assert_eq!(
            store.get("docs-docs-a-md-setup").await.unwrap().unwrap().file_path,
            "docs/docs/a.md"
        );
        assert_eq!(
            store.get("docs-docs-a-md-setup-1").await.unwrap().unwrap().file_path,
            "docs/docs-a.md"
        );
    }

    #[tokio::test]
    async fn test_index_file_rejects_non_markdown() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "docs/notes.txt", "plain");
        let indexer = indexer(&dir, DocentConfig::default()).await;

        let err = indexer.index_file(Path::new("docs/notes.txt")).await.unwrap_err();
        assert!(err.to_string().contains("Only .md files are supported"));
    }

    #[tokio::test]
    async fn test_drop_empty_chunks_option() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md", "# Empty\n# Full\ncontent\n");

        let config = DocentConfig::default().with_index(IndexConfig {
            drop_empty_chunks: true,
            ..Default::default()
        });
        let indexer = indexer(&dir, config).await;
        let report = indexer.index_workspace().await.unwrap();
        assert_eq!(report.chunks_stored, 1);
    }

    #[tokio::test]
    async fn test_code_fence_option_reaches_chunker() {
        let dir = TempDir::new().unwrap();
        let readme = "# Build\n```sh\n# install deps\nnpm ci\n```\n# Test\nrun it\n";
        write(dir.path(), "README.md", readme);

        let plain = indexer(&dir, DocentConfig::default()).await;
        assert_eq!(plain.index_workspace().await.unwrap().chunks_stored, 3);

        let config = DocentConfig::default().with_index(IndexConfig {
            respect_code_fences: true,
            ..Default::default()
        });
        let fenced = indexer(&dir, config).await;
        assert_eq!(fenced.index_workspace().await.unwrap().chunks_stored, 2);
        assert_eq!(fenced.engine.store().len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_reindex_invalidates_cached_explanations() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "README.md",
            "## calculateSum\nAdds two numbers together and returns the result.\n",
        );
        let indexer = indexer(&dir, DocentConfig::default()).await;
        indexer.index_workspace().await.unwrap();

        let context =
            CodeContext::new("function calculateSum(a,b){return a+b;}", "m.js", "javascript")
                .with_function_name("calculateSum");
        let engine = &indexer.engine;
        assert!(engine.explain_code(&context).await.unwrap().has_relevant_docs);
        assert!(engine.cache().has(&context).await);

        indexer.index_file(Path::new("README.md")).await.unwrap();
        assert!(!engine.cache().has(&context).await);
    }
}
