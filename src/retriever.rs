//! Online read path: question → embedding → top-k → context string.

use std::sync::Arc;

use crate::embeddings::EmbeddingProvider;
use crate::stores::VectorStore;
use crate::types::RagError;

/// Assembles grounding context for a question from the persisted index.
///
/// Must be constructed with the same provider identity the index was built
/// with; [`crate::stores::SqliteVectorStore::open`] enforces that pairing at
/// startup, so by the time a `Retriever` exists the ingest/query models
/// match.
#[derive(Clone)]
pub struct Retriever {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    top_k: usize,
}

impl Retriever {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        top_k: usize,
    ) -> Self {
        Self {
            provider,
            store,
            top_k: top_k.max(1),
        }
    }

    /// Embeds `question` (the empty string is embedded as-is), queries the
    /// top-k chunks, and joins their texts most-similar-first with a blank
    /// line.
    ///
    /// An empty index or a query with no matches yields `Ok("")` — "no
    /// grounding available", not a failure. Provider and store errors are
    /// surfaced typed so the boundary layer can answer with its own
    /// fallback instead of leaking internals.
    pub async fn retrieve_context(&self, question: &str) -> Result<String, RagError> {
        let embedding = self.provider.embed(question).await?;
        let hits = self.store.query(&embedding, self.top_k).await?;

        if hits.is_empty() {
            return Ok(String::new());
        }

        tracing::debug!(hits = hits.len(), top_score = hits[0].score, "context assembled");
        Ok(hits
            .iter()
            .map(|hit| hit.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockEmbeddingProvider;
    use crate::stores::{ChunkMetadata, ChunkRecord, SqliteVectorStore};
    use tempfile::tempdir;

    async fn retriever_with_store(dir: &std::path::Path) -> (Retriever, Arc<SqliteVectorStore>) {
        let provider = Arc::new(MockEmbeddingProvider::new());
        let store = Arc::new(
            SqliteVectorStore::open(
                dir.join("idx.sqlite"),
                provider.model_id(),
                provider.dimensions(),
            )
            .await
            .unwrap(),
        );
        let retriever = Retriever::new(provider, Arc::clone(&store) as Arc<dyn VectorStore>, 4);
        (retriever, store)
    }

    #[tokio::test]
    async fn empty_store_yields_empty_context() {
        let dir = tempdir().unwrap();
        let (retriever, _store) = retriever_with_store(dir.path()).await;
        let context = retriever.retrieve_context("anything at all").await.unwrap();
        assert_eq!(context, "");
    }

    #[tokio::test]
    async fn empty_question_is_embedded_as_is() {
        let dir = tempdir().unwrap();
        let (retriever, _store) = retriever_with_store(dir.path()).await;
        let context = retriever.retrieve_context("").await.unwrap();
        assert_eq!(context, "");
    }

    #[tokio::test]
    async fn contexts_join_with_a_blank_line() {
        let dir = tempdir().unwrap();
        let (retriever, store) = retriever_with_store(dir.path()).await;
        let provider = MockEmbeddingProvider::new();

        for (id, text) in [("a", "first chunk"), ("b", "second chunk")] {
            store
                .upsert(ChunkRecord {
                    id: id.to_string(),
                    content: text.to_string(),
                    embedding: provider.embed(text).await.unwrap(),
                    metadata: ChunkMetadata::for_source("/about"),
                })
                .await
                .unwrap();
        }

        let context = retriever.retrieve_context("first chunk").await.unwrap();
        assert!(context.contains("first chunk"));
        assert!(context.contains("\n\n"));
    }
}
