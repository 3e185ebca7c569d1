//! Per-user document index with similarity retrieval
//!
//! Each user's chunks live in their own collection, keyed by a name derived
//! from the user id. Queries only ever see the collection behind the handle
//! they were given, so cross-user leakage is impossible by construction
//! rather than prevented by a filter.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

use crate::embeddings::EmbeddingProvider;
use crate::error::Result;
use crate::types::Chunk;

/// Handle to a user's document collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceHandle {
    name: String,
    user_id: String,
}

impl NamespaceHandle {
    /// Collection name behind this handle
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning user
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

/// A retrieved chunk with its similarity to the query
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Similarity score (0.0-1.0, higher is better)
    pub similarity: f32,
}

struct IndexedChunk {
    chunk: Chunk,
    embedding: Vec<f32>,
}

struct Collection {
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
    entries: Vec<IndexedChunk>,
}

impl Collection {
    fn new() -> Self {
        Self {
            created_at: Utc::now(),
            entries: Vec::new(),
        }
    }
}

/// Namespace-isolated chunk store with similarity queries
pub struct DocumentIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    collections: DashMap<String, Collection>,
}

impl DocumentIndex {
    /// Create an index over the given embedding provider
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            collections: DashMap::new(),
        }
    }

    /// Collection name for a user
    pub fn collection_name(user_id: &str) -> String {
        format!("user_{}_documents", user_id)
    }

    /// Get or create the collection for a user. Idempotent; repeated calls
    /// return handles to the same collection.
    pub fn ensure_namespace(&self, user_id: &str) -> NamespaceHandle {
        let name = Self::collection_name(user_id);
        self.collections.entry(name.clone()).or_insert_with(Collection::new);

        NamespaceHandle {
            name,
            user_id: user_id.to_string(),
        }
    }

    /// Add a batch of chunks to a collection.
    ///
    /// An empty batch is a no-op and returns 0 without touching the
    /// collection. The whole batch is embedded before anything is stored,
    /// so an embedding failure leaves the collection unchanged.
    pub async fn add(&self, handle: &NamespaceHandle, chunks: Vec<Chunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let staged: Vec<IndexedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk { chunk, embedding })
            .collect();

        let added = staged.len();
        let mut collection = self
            .collections
            .entry(handle.name().to_string())
            .or_insert_with(Collection::new);
        collection.entries.extend(staged);

        tracing::info!(
            collection = handle.name(),
            chunks = added,
            "added chunks to document index"
        );

        Ok(added)
    }

    /// Query a collection for the chunks most similar to `question`.
    ///
    /// Returns up to `k` results, most similar first. An empty or missing
    /// collection yields an empty result, not an error.
    pub async fn query(
        &self,
        handle: &NamespaceHandle,
        question: &str,
        k: usize,
    ) -> Result<Vec<SearchResult>> {
        {
            let Some(collection) = self.collections.get(handle.name()) else {
                return Ok(Vec::new());
            };
            if collection.entries.is_empty() {
                return Ok(Vec::new());
            }
        }

        let query_embedding = self.embedder.embed(question).await?;

        let Some(collection) = self.collections.get(handle.name()) else {
            return Ok(Vec::new());
        };

        let mut results: Vec<SearchResult> = collection
            .entries
            .iter()
            .map(|entry| SearchResult {
                chunk: entry.chunk.clone(),
                similarity: cosine_similarity(&query_embedding, &entry.embedding),
            })
            .collect();

        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);

        Ok(results)
    }

    /// Delete a collection's contents and recreate it empty. This is the
    /// only delete operation; single chunks are never removed.
    pub fn clear(&self, handle: &NamespaceHandle) {
        self.collections
            .insert(handle.name().to_string(), Collection::new());
        tracing::info!(collection = handle.name(), "cleared document index");
    }

    /// Number of chunks stored in a collection
    pub fn chunk_count(&self, handle: &NamespaceHandle) -> usize {
        self.collections
            .get(handle.name())
            .map(|c| c.entries.len())
            .unwrap_or(0)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashingEmbedder;
    use std::path::Path;

    fn test_index() -> DocumentIndex {
        DocumentIndex::new(Arc::new(HashingEmbedder::default()))
    }

    fn chunk(user_id: &str, index: u32, content: &str) -> Chunk {
        Chunk::new(
            user_id,
            Path::new("uploads/user_USR0001/notes.txt"),
            index,
            content.to_string(),
        )
    }

    #[tokio::test]
    async fn ensure_namespace_is_idempotent() {
        let index = test_index();
        let first = index.ensure_namespace("USR0001");
        let second = index.ensure_namespace("USR0001");

        assert_eq!(first, second);
        assert_eq!(first.name(), "user_USR0001_documents");

        index
            .add(&first, vec![chunk("USR0001", 0, "alpha beta gamma.")])
            .await
            .unwrap();
        assert_eq!(index.chunk_count(&second), 1);
    }

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let index = test_index();
        let a = index.ensure_namespace("USR0001");
        let b = index.ensure_namespace("USR0002");

        index
            .add(&a, vec![chunk("USR0001", 0, "the secret launch code is blue.")])
            .await
            .unwrap();

        let leaked = index
            .query(&b, "the secret launch code is blue.", 10)
            .await
            .unwrap();
        assert!(leaked.is_empty());

        let found = index
            .query(&a, "the secret launch code is blue.", 10)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let index = test_index();
        let handle = index.ensure_namespace("USR0001");

        let added = index.add(&handle, Vec::new()).await.unwrap();
        assert_eq!(added, 0);
        assert_eq!(index.chunk_count(&handle), 0);
    }

    #[tokio::test]
    async fn exact_text_ranks_its_chunk_first() {
        let index = test_index();
        let handle = index.ensure_namespace("USR0001");

        let first = "Rust guarantees memory safety without garbage collection.";
        let second = "Apples and oranges are fruit sold at the market.";
        index
            .add(
                &handle,
                vec![chunk("USR0001", 0, first), chunk("USR0001", 1, second)],
            )
            .await
            .unwrap();

        let results = index.query(&handle, first, 3).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.content, first);
        assert!(results[0].similarity > results[1].similarity);
        assert!((results[0].similarity - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn query_on_empty_namespace_returns_empty() {
        let index = test_index();
        let handle = index.ensure_namespace("USR0001");

        let results = index.query(&handle, "anything at all", 3).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn clear_recreates_an_empty_namespace() {
        let index = test_index();
        let handle = index.ensure_namespace("USR0001");

        index
            .add(&handle, vec![chunk("USR0001", 0, "some indexed text.")])
            .await
            .unwrap();
        assert_eq!(index.chunk_count(&handle), 1);

        index.clear(&handle);
        assert_eq!(index.chunk_count(&handle), 0);

        let results = index.query(&handle, "some indexed text.", 3).await.unwrap();
        assert!(results.is_empty());
    }
}
