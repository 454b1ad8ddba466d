//! Persistent vector storage for embedded chunks.
//!
//! The [`VectorStore`] trait is the only surface the ingestion pipeline and
//! the retriever touch; the underlying files belong to the store
//! implementation alone. One implementation ships here:
//! [`sqlite::SqliteVectorStore`], SQLite with vector search via `sqlite-vec`.

pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::RagError;

pub use sqlite::SqliteVectorStore;

/// Fixed metadata attached to every stored chunk.
///
/// `source_url` is the normalized page path the chunk came from. Fields that
/// do not warrant a named column yet travel in `extra`, which round-trips as
/// part of the metadata JSON blob.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ChunkMetadata {
    pub fn for_source(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            section: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// The atomic indexed unit: id, text, embedding, and metadata.
///
/// The embedding length must match the dimension the index was opened with;
/// upsert rejects anything else.
#[derive(Clone, Debug)]
pub struct ChunkRecord {
    pub id: String,
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// A query hit: chunk text, its metadata, and a similarity score in
/// most-similar-first order.
#[derive(Clone, Debug)]
pub struct ScoredChunk {
    pub content: String,
    pub metadata: ChunkMetadata,
    pub score: f32,
}

/// Contract between the pipeline/retriever and the persisted index.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Inserts `record`, replacing any existing record with the same id.
    /// Persistence is synchronous per call.
    async fn upsert(&self, record: ChunkRecord) -> Result<(), RagError>;

    /// Returns up to `top_k` chunks ordered by similarity descending. An
    /// empty collection yields an empty vector, not an error. Never mutates
    /// the store.
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>, RagError>;

    /// Total number of stored chunks; the post-ingestion coverage check.
    async fn count(&self) -> Result<usize, RagError>;
}
