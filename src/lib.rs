//! ```text
//! Seed URL ──► crawler::CrawlSession ──► (url, visible text) pages
//!                      │
//!                      └─ crawler::PageRenderer (HTTP or browser-backed)
//!
//! Page text ──► chunker::chunk_words ──► word-window chunks
//!
//! Chunk ──► embeddings::EmbeddingProvider ──► stores::SqliteVectorStore
//!                                                      │
//! Question ──► retriever::Retriever ◄──────────────────┘
//!                      │
//!                      └─► generation::build_prompt ──► downstream LLM
//! ```
//!
//! Ingestion is a one-shot offline batch job ([`ingestion::IngestionPipeline`])
//! that populates a persisted SQLite vector index; retrieval is the online,
//! read-only path against that index. Both sides must share one embedding
//! provider identity — the store records it at first open and refuses to open
//! against a different model.

pub mod chunker;
pub mod config;
pub mod crawler;
pub mod embeddings;
pub mod generation;
pub mod ingestion;
pub mod retriever;
pub mod stores;
pub mod types;

pub use chunker::chunk_words;
pub use config::RagConfig;
pub use crawler::{CrawledPage, Crawler, HttpRenderer, PageRenderer, RenderedPage};
pub use embeddings::{EmbeddingProvider, MockEmbeddingProvider, RemoteEmbeddingProvider};
pub use generation::{FALLBACK_ANSWER, Generator, build_prompt};
pub use ingestion::{IngestReport, IngestionPipeline};
pub use retriever::Retriever;
pub use stores::{ChunkMetadata, ChunkRecord, ScoredChunk, SqliteVectorStore, VectorStore};
pub use types::RagError;
