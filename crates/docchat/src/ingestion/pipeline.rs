//! Ingestion orchestration across a batch of files

use std::path::{Path, PathBuf};

use crate::config::ChunkingConfig;
use crate::error::Result;
use crate::index::{DocumentIndex, NamespaceHandle};
use crate::types::Chunk;

use super::chunker::SentenceChunker;
use super::parser::{Extracted, FileParser};

/// A file that contributed no chunks
#[derive(Debug, Clone)]
pub struct SkippedFile {
    /// Source filename
    pub filename: String,
    /// Why it was skipped
    pub reason: String,
}

/// Result of an ingestion run
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Chunk segments added to the index
    pub chunks_added: usize,
    /// Files that contributed at least one chunk
    pub files_indexed: usize,
    /// Files skipped, with reasons
    pub skipped: Vec<SkippedFile>,
}

impl IngestReport {
    /// True when no file in the batch produced any content
    pub fn no_valid_content(&self) -> bool {
        self.files_indexed == 0
    }
}

/// Extracts, chunks, and indexes batches of files for one user
pub struct IngestPipeline {
    chunker: SentenceChunker,
}

impl IngestPipeline {
    /// Create a pipeline with the given chunking configuration
    pub fn new(chunking: &ChunkingConfig) -> Self {
        Self {
            chunker: SentenceChunker::new(chunking.max_chars),
        }
    }

    /// Ingest a batch of files into a user's collection.
    ///
    /// Files that fail to extract or produce no content are skipped and
    /// reported; they never abort the batch. All produced chunks become
    /// queryable together through a single index add at the end.
    pub async fn ingest(
        &self,
        paths: &[PathBuf],
        index: &DocumentIndex,
        handle: &NamespaceHandle,
        user_id: &str,
    ) -> Result<IngestReport> {
        let mut batch: Vec<Chunk> = Vec::new();
        let mut report = IngestReport::default();

        for path in paths {
            match self.chunk_file(path, user_id) {
                Ok(chunks) if !chunks.is_empty() => {
                    report.files_indexed += 1;
                    batch.extend(chunks);
                }
                Ok(_) => {
                    report.skipped.push(SkippedFile {
                        filename: display_name(path),
                        reason: "no extractable content".to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "skipping file");
                    report.skipped.push(SkippedFile {
                        filename: display_name(path),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if !batch.is_empty() {
            report.chunks_added = index.add(handle, batch).await?;
        }

        tracing::info!(
            chunks = report.chunks_added,
            files = report.files_indexed,
            skipped = report.skipped.len(),
            "ingestion finished"
        );

        Ok(report)
    }

    /// Extract and chunk one file
    fn chunk_file(&self, path: &Path, user_id: &str) -> Result<Vec<Chunk>> {
        let chunks = match FileParser::extract(path)? {
            Extracted::Content(text) => self
                .chunker
                .chunk(&text)
                .into_iter()
                .enumerate()
                .map(|(i, content)| Chunk::new(user_id, path, i as u32, content))
                .collect(),
            Extracted::Empty => Vec::new(),
        };

        Ok(chunks)
    }
}

impl Default for IngestPipeline {
    fn default() -> Self {
        Self::new(&ChunkingConfig::default())
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashingEmbedder;
    use std::sync::Arc;

    fn test_index() -> DocumentIndex {
        DocumentIndex::new(Arc::new(HashingEmbedder::default()))
    }

    #[tokio::test]
    async fn ingested_chunk_is_retrievable_by_its_own_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facts.txt");
        let first = "The capital of France is Paris and it sits on the Seine.";
        let second = "Basalt is a volcanic rock common on ocean floors.";
        std::fs::write(&path, format!("{} {}", first, second)).unwrap();

        let index = test_index();
        let handle = index.ensure_namespace("USR0001");
        let pipeline = IngestPipeline::new(&ChunkingConfig { max_chars: 60 });

        let report = pipeline
            .ingest(&[path], &index, &handle, "USR0001")
            .await
            .unwrap();
        assert_eq!(report.files_indexed, 1);
        assert_eq!(report.chunks_added, 2);

        let results = index.query(&handle, first, 3).await.unwrap();
        assert_eq!(results[0].chunk.content, first);
        assert_eq!(results[0].chunk.chunk_index, 0);
        assert_eq!(results[0].chunk.filename, "facts.txt");
    }

    #[tokio::test]
    async fn unsupported_file_is_skipped_without_aborting_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let one = dir.path().join("one.txt");
        let two = dir.path().join("two.exe");
        let three = dir.path().join("three.txt");
        std::fs::write(&one, "Content of file one.").unwrap();
        std::fs::write(&two, b"\x00\x01binary").unwrap();
        std::fs::write(&three, "Content of file three.").unwrap();

        let index = test_index();
        let handle = index.ensure_namespace("USR0001");
        let pipeline = IngestPipeline::default();

        let report = pipeline
            .ingest(&[one, two, three], &index, &handle, "USR0001")
            .await
            .unwrap();

        assert_eq!(report.files_indexed, 2);
        assert_eq!(report.chunks_added, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].filename, "two.exe");
        assert!(!report.no_valid_content());
    }

    #[tokio::test]
    async fn all_unsupported_files_yield_no_valid_content_and_leave_index_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.exe");
        let b = dir.path().join("b.bin");
        std::fs::write(&a, b"x").unwrap();
        std::fs::write(&b, b"y").unwrap();

        let index = test_index();
        let handle = index.ensure_namespace("USR0001");
        let pipeline = IngestPipeline::default();

        let report = pipeline
            .ingest(&[a, b], &index, &handle, "USR0001")
            .await
            .unwrap();

        assert!(report.no_valid_content());
        assert_eq!(report.chunks_added, 0);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(index.chunk_count(&handle), 0);
    }

    #[tokio::test]
    async fn unreadable_file_is_isolated_to_its_own_entry() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.txt");
        let missing = dir.path().join("missing.txt");
        std::fs::write(&good, "Readable content here.").unwrap();

        let index = test_index();
        let handle = index.ensure_namespace("USR0001");
        let pipeline = IngestPipeline::default();

        let report = pipeline
            .ingest(&[missing, good], &index, &handle, "USR0001")
            .await
            .unwrap();

        assert_eq!(report.files_indexed, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].filename, "missing.txt");
    }
}
