//! Embedding providers: one contract, interchangeable backends.
//!
//! Every provider maps text to a fixed-length `f32` vector, deterministically
//! for a given model version and input. The persisted index records the
//! provider identity at first open, so ingestion and query time are forced
//! onto the same model (see [`crate::stores`]).
//!
//! The empty string is embedded as-is; providers never reject it.

mod mock;
mod remote;

#[cfg(feature = "local-model")]
mod local;

use async_trait::async_trait;

use crate::types::RagError;

pub use mock::MockEmbeddingProvider;
pub use remote::RemoteEmbeddingProvider;

#[cfg(feature = "local-model")]
pub use local::LocalEmbeddingProvider;

/// Maps text to a fixed-dimension embedding vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier of the underlying model; persisted alongside the index and
    /// validated on open.
    fn model_id(&self) -> &str;

    /// Length of every vector this provider produces.
    fn dimensions(&self) -> usize;

    /// Embeds `text`, returning a vector of exactly [`dimensions`] floats.
    ///
    /// [`dimensions`]: EmbeddingProvider::dimensions
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError>;
}
