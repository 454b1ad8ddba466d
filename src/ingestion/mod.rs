//! Offline batch ingestion: crawl, chunk, embed, persist.

use std::sync::Arc;

use url::Url;
use uuid::Uuid;

use crate::chunker::chunk_words;
use crate::crawler::Crawler;
use crate::embeddings::EmbeddingProvider;
use crate::stores::{ChunkMetadata, ChunkRecord, VectorStore};
use crate::types::RagError;

/// Totals from one ingestion run.
///
/// `chunks_indexed` against a later [`VectorStore::count`] is the
/// post-ingestion coverage check: a run that absorbed failures simply leaves
/// fewer documents in the index than the live site has.
#[derive(Clone, Copy, Debug, Default)]
pub struct IngestReport {
    /// Pages whose chunks were (at least partially) indexed.
    pub pages_indexed: usize,
    /// Pages the crawl visited but produced nothing to index.
    pub pages_skipped: usize,
    /// Chunks embedded and upserted.
    pub chunks_indexed: usize,
    /// Chunks dropped after an embed or upsert failure.
    pub chunks_failed: usize,
}

/// Drives Crawler → Chunker → Embedding Provider → Vector Store.
///
/// The run is strictly sequential: one page rendered at a time, one
/// embedding call at a time, one upsert at a time. A failing chunk is logged
/// and dropped; the rest of the page and the rest of the crawl continue.
pub struct IngestionPipeline {
    crawler: Crawler,
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    chunk_size: usize,
}

impl IngestionPipeline {
    pub fn new(
        crawler: Crawler,
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        chunk_size: usize,
    ) -> Self {
        Self {
            crawler,
            provider,
            store,
            chunk_size,
        }
    }

    /// Crawls from `seed` and populates the index, returning run totals.
    pub async fn ingest(&self, seed: Url) -> Result<IngestReport, RagError> {
        let mut report = IngestReport::default();
        let mut session = self.crawler.start(seed);

        while let Some(page) = session.next_page().await {
            let chunks = chunk_words(&page.text, self.chunk_size);
            let mut stored = 0usize;

            for (index, chunk) in chunks.iter().enumerate() {
                match self.index_chunk(&page.source_url, index, chunk).await {
                    Ok(()) => stored += 1,
                    Err(err) => {
                        report.chunks_failed += 1;
                        tracing::warn!(
                            source_url = %page.source_url,
                            chunk_index = index,
                            error = %err,
                            "dropping chunk"
                        );
                    }
                }
            }

            if stored > 0 {
                report.pages_indexed += 1;
                report.chunks_indexed += stored;
                tracing::info!(source_url = %page.source_url, chunks = stored, "page indexed");
            } else {
                report.pages_skipped += 1;
            }
        }

        tracing::info!(
            pages = report.pages_indexed,
            chunks = report.chunks_indexed,
            failed = report.chunks_failed,
            "ingestion complete"
        );
        Ok(report)
    }

    async fn index_chunk(
        &self,
        source_url: &str,
        index: usize,
        content: &str,
    ) -> Result<(), RagError> {
        let embedding = self.provider.embed(content).await?;
        let mut metadata = ChunkMetadata::for_source(source_url);
        metadata
            .extra
            .insert("chunk_index".to_string(), serde_json::json!(index));
        self.store
            .upsert(ChunkRecord {
                id: Uuid::new_v4().to_string(),
                content: content.to_string(),
                embedding,
                metadata,
            })
            .await
    }
}
