//! Top-k retrieval and grounding context assembly

use crate::error::Result;
use crate::index::{DocumentIndex, NamespaceHandle};

/// Outcome of a retrieval pass.
///
/// "Nothing relevant" is an ordinary outcome, not an error; the caller
/// falls back to sending the raw question ungrounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieval {
    /// Formatted document content to ground the answer in
    Grounded { context: String },
    /// No relevant information found in the user's documents
    NoRelevantInformation,
}

impl Retrieval {
    /// Whether document content was found
    pub fn is_grounded(&self) -> bool {
        matches!(self, Self::Grounded { .. })
    }
}

/// Fetches the chunks most relevant to a question and assembles them into
/// a grounding context.
pub struct RetrievalComposer {
    top_k: usize,
}

impl RetrievalComposer {
    /// Default number of chunks retrieved per question
    pub const DEFAULT_TOP_K: usize = 3;

    /// Create a composer retrieving `top_k` chunks per question
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    /// Retrieve the top chunks for `question` and format them as source
    /// blocks, in ranked order.
    pub async fn compose(
        &self,
        index: &DocumentIndex,
        handle: &NamespaceHandle,
        question: &str,
    ) -> Result<Retrieval> {
        let results = index.query(handle, question, self.top_k).await?;

        if results.is_empty() {
            return Ok(Retrieval::NoRelevantInformation);
        }

        let context = results
            .iter()
            .map(|r| format!("Source: {}\nContent: {}\n", r.chunk.filename, r.chunk.content))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(Retrieval::Grounded { context })
    }
}

impl Default for RetrievalComposer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TOP_K)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashingEmbedder;
    use crate::types::Chunk;
    use std::path::Path;
    use std::sync::Arc;

    fn chunk(index: u32, content: &str) -> Chunk {
        Chunk::new(
            "USR0001",
            Path::new("uploads/user_USR0001/manual.txt"),
            index,
            content.to_string(),
        )
    }

    #[tokio::test]
    async fn empty_namespace_composes_the_no_information_marker() {
        let index = DocumentIndex::new(Arc::new(HashingEmbedder::default()));
        let handle = index.ensure_namespace("USR0001");

        let retrieval = RetrievalComposer::default()
            .compose(&index, &handle, "what is the warranty period?")
            .await
            .unwrap();
        assert_eq!(retrieval, Retrieval::NoRelevantInformation);
    }

    #[tokio::test]
    async fn grounded_context_labels_sources_in_ranked_order() {
        let index = DocumentIndex::new(Arc::new(HashingEmbedder::default()));
        let handle = index.ensure_namespace("USR0001");

        let relevant = "The warranty period is two years from purchase.";
        index
            .add(
                &handle,
                vec![
                    chunk(0, relevant),
                    chunk(1, "Unrelated text about shipping addresses."),
                ],
            )
            .await
            .unwrap();

        let retrieval = RetrievalComposer::default()
            .compose(&index, &handle, relevant)
            .await
            .unwrap();

        let Retrieval::Grounded { context } = retrieval else {
            panic!("expected grounded retrieval");
        };
        assert!(context.starts_with(&format!("Source: manual.txt\nContent: {}\n", relevant)));
        // blocks are separated by a blank line
        assert!(context.contains("\n\nSource: manual.txt\n"));
    }

    #[tokio::test]
    async fn cleared_namespace_composes_the_marker_again() {
        let index = DocumentIndex::new(Arc::new(HashingEmbedder::default()));
        let handle = index.ensure_namespace("USR0001");

        index
            .add(&handle, vec![chunk(0, "Indexed content to clear.")])
            .await
            .unwrap();
        index.clear(&handle);

        let retrieval = RetrievalComposer::default()
            .compose(&index, &handle, "Indexed content to clear.")
            .await
            .unwrap();
        assert_eq!(retrieval, Retrieval::NoRelevantInformation);
    }
}
