//! Deterministic embedding provider for tests and offline runs.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::EmbeddingProvider;
use crate::types::RagError;

/// Hash-derived embeddings: identical input always maps to the identical
/// vector, distinct inputs almost always differ. Useful wherever the
/// pipeline's plumbing matters more than semantic similarity.
pub struct MockEmbeddingProvider {
    dimensions: usize,
    cache: RwLock<HashMap<String, Vec<f32>>>,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self::with_dimensions(8)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
            cache: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn model_id(&self) -> &str {
        "mock-hash"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        if let Some(vector) = self.cache.read().get(text) {
            return Ok(vector.clone());
        }
        let vector = hash_to_vec(text, self.dimensions);
        self.cache
            .write()
            .insert(text.to_string(), vector.clone());
        Ok(vector)
    }
}

fn hash_to_vec(text: &str, dimensions: usize) -> Vec<f32> {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    text.hash(&mut hasher);
    let seed = hasher.finish();
    (0..dimensions)
        .map(|i| {
            let bits = seed.rotate_left((i % 64) as u32 * 7) ^ ((i as u64) << 24);
            (bits as f64 / u64::MAX as f64) as f32
        })
        .collect()
}
