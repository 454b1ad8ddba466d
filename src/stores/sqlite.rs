//! SQLite-backed vector index using the `sqlite-vec` extension.

use std::mem::transmute;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::OnceLock;

use async_trait::async_trait;
use tokio_rusqlite::{Connection, OptionalExtension, ffi};

use super::{ChunkMetadata, ChunkRecord, ScoredChunk, VectorStore};
use crate::types::RagError;

const META_MODEL_KEY: &str = "embedding_model";
const META_DIMENSIONS_KEY: &str = "embedding_dimensions";

/// Persisted chunk collection: a `chunks` row table joined with a
/// `chunks_embeddings` vec0 virtual table, plus an `index_meta` table that
/// pins the embedding model identity the index was built with.
///
/// [`open`] is idempotent; reopening an existing index with a different
/// model id or dimension fails fast with [`RagError::ModelMismatch`] instead
/// of silently serving cross-model similarity scores.
///
/// [`open`]: SqliteVectorStore::open
#[derive(Clone, Debug)]
pub struct SqliteVectorStore {
    conn: Connection,
    model_id: String,
    dimensions: usize,
}

impl SqliteVectorStore {
    /// Opens or creates the collection at `path` for the given provider
    /// identity.
    pub async fn open(
        path: impl AsRef<Path>,
        model_id: &str,
        dimensions: usize,
    ) -> Result<Self, RagError> {
        register_sqlite_vec()?;

        let conn = Connection::open(path)
            .await
            .map_err(|err| RagError::Storage(err.to_string()))?;

        conn.call(|conn| {
            let version =
                conn.query_row("select vec_version()", [], |row| row.get::<_, String>(0))?;
            tracing::debug!(version = %version, "sqlite-vec extension loaded");
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS chunks (
                     id TEXT PRIMARY KEY,
                     url TEXT,
                     content TEXT NOT NULL,
                     metadata TEXT NOT NULL
                 );
                 CREATE INDEX IF NOT EXISTS idx_chunks_url ON chunks(url);
                 CREATE TABLE IF NOT EXISTS index_meta (
                     key TEXT PRIMARY KEY,
                     value TEXT NOT NULL
                 );",
            )?;
            Ok(())
        })
        .await
        .map_err(|err: tokio_rusqlite::Error| RagError::Storage(err.to_string()))?;

        let stored = conn
            .call(|conn| {
                let model = conn
                    .query_row(
                        "SELECT value FROM index_meta WHERE key = ?1",
                        [META_MODEL_KEY],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?;
                let dims = conn
                    .query_row(
                        "SELECT value FROM index_meta WHERE key = ?1",
                        [META_DIMENSIONS_KEY],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?;
                Ok(model.zip(dims))
            })
            .await
            .map_err(|err: tokio_rusqlite::Error| RagError::Storage(err.to_string()))?;

        if let Some((stored_model, stored_dims)) = stored {
            let stored_dims: usize = stored_dims
                .parse()
                .map_err(|_| RagError::Storage(format!("corrupt index_meta: {stored_dims}")))?;
            if stored_model != model_id || stored_dims != dimensions {
                return Err(RagError::ModelMismatch {
                    stored: stored_model,
                    stored_dims,
                    active: model_id.to_string(),
                    active_dims: dimensions,
                });
            }
        }

        let model = model_id.to_string();
        let dims = dimensions;
        conn.call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO index_meta (key, value) VALUES (?1, ?2)",
                (META_MODEL_KEY, &model),
            )?;
            conn.execute(
                "INSERT OR IGNORE INTO index_meta (key, value) VALUES (?1, ?2)",
                (META_DIMENSIONS_KEY, dims.to_string()),
            )?;
            conn.execute_batch(&format!(
                "CREATE VIRTUAL TABLE IF NOT EXISTS chunks_embeddings
                 USING vec0(id TEXT PRIMARY KEY, embedding FLOAT[{dims}])"
            ))?;
            Ok(())
        })
        .await
        .map_err(|err: tokio_rusqlite::Error| RagError::Storage(err.to_string()))?;

        Ok(Self {
            conn,
            model_id: model_id.to_string(),
            dimensions,
        })
    }

    /// Model identity the index is pinned to.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Embedding dimension every stored vector must carry.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn upsert(&self, record: ChunkRecord) -> Result<(), RagError> {
        if record.embedding.len() != self.dimensions {
            return Err(RagError::Dimension {
                got: record.embedding.len(),
                want: self.dimensions,
            });
        }

        let metadata = serde_json::to_string(&record.metadata)
            .map_err(|err| RagError::Storage(err.to_string()))?;
        let embedding = serde_json::to_string(&record.embedding)
            .map_err(|err| RagError::Storage(err.to_string()))?;

        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR REPLACE INTO chunks (id, url, content, metadata)
                     VALUES (?1, ?2, ?3, ?4)",
                    (
                        &record.id,
                        &record.metadata.source_url,
                        &record.content,
                        &metadata,
                    ),
                )?;
                // vec0 tables have no REPLACE semantics; clear then insert.
                tx.execute("DELETE FROM chunks_embeddings WHERE id = ?1", (&record.id,))?;
                tx.execute(
                    "INSERT INTO chunks_embeddings (id, embedding) VALUES (?1, vec_f32(?2))",
                    (&record.id, &embedding),
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(|err: tokio_rusqlite::Error| RagError::Storage(err.to_string()))
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>, RagError> {
        if embedding.len() != self.dimensions {
            return Err(RagError::Dimension {
                got: embedding.len(),
                want: self.dimensions,
            });
        }

        let embedding_json = serde_json::to_string(embedding)
            .map_err(|err| RagError::Storage(err.to_string()))?;

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT c.content, c.metadata,
                            vec_distance_cosine(e.embedding, vec_f32(?1)) AS distance
                     FROM chunks c
                     JOIN chunks_embeddings e ON c.id = e.id
                     ORDER BY distance ASC
                     LIMIT ?2",
                )?;

                let rows = stmt.query_map((&embedding_json, top_k as i64), |row| {
                    let content: String = row.get(0)?;
                    let metadata: String = row.get(1)?;
                    let distance: f32 = row.get(2)?;
                    let metadata = serde_json::from_str::<ChunkMetadata>(&metadata)
                        .unwrap_or_default();
                    Ok(ScoredChunk {
                        content,
                        metadata,
                        // Cosine distance in [0, 2]; report as similarity.
                        score: 1.0 - distance,
                    })
                })?;

                let mut results = Vec::new();
                for row in rows {
                    results.push(row?);
                }
                Ok(results)
            })
            .await
            .map_err(|err: tokio_rusqlite::Error| RagError::Storage(err.to_string()))
    }

    async fn count(&self) -> Result<usize, RagError> {
        self.conn
            .call(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
                Ok(count as usize)
            })
            .await
            .map_err(|err: tokio_rusqlite::Error| RagError::Storage(err.to_string()))
    }
}

/// Registers sqlite-vec as an auto-loaded extension, exactly once per
/// process. Later connections reuse the registration.
fn register_sqlite_vec() -> Result<(), RagError> {
    static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

    let result = REGISTERED.get_or_init(|| unsafe {
        type SqliteExtensionInit = unsafe extern "C" fn(
            *mut ffi::sqlite3,
            *mut *mut c_char,
            *const ffi::sqlite3_api_routines,
        ) -> i32;

        let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
        let init_fn: SqliteExtensionInit =
            transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
        let rc = ffi::sqlite3_auto_extension(Some(init_fn));
        if rc != 0 {
            Err(format!("failed to register sqlite-vec extension (code {rc})"))
        } else {
            Ok(())
        }
    });

    result.clone().map_err(RagError::Storage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(id: &str, content: &str, embedding: Vec<f32>, source: &str) -> ChunkRecord {
        ChunkRecord {
            id: id.to_string(),
            content: content.to_string(),
            embedding,
            metadata: ChunkMetadata::for_source(source),
        }
    }

    #[tokio::test]
    async fn query_on_empty_collection_returns_nothing() {
        let dir = tempdir().unwrap();
        let store = SqliteVectorStore::open(dir.path().join("idx.sqlite"), "mock-hash", 4)
            .await
            .unwrap();
        let hits = store.query(&[1.0, 0.0, 0.0, 0.0], 5).await.unwrap();
        assert!(hits.is_empty());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn upserted_record_is_the_top_match_for_its_own_vector() {
        let dir = tempdir().unwrap();
        let store = SqliteVectorStore::open(dir.path().join("idx.sqlite"), "mock-hash", 4)
            .await
            .unwrap();

        store
            .upsert(record("a", "alpha text", vec![1.0, 0.0, 0.0, 0.0], "/a"))
            .await
            .unwrap();
        store
            .upsert(record("b", "beta text", vec![0.0, 1.0, 0.0, 0.0], "/b"))
            .await
            .unwrap();

        let hits = store.query(&[1.0, 0.0, 0.0, 0.0], 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "alpha text");
        assert_eq!(hits[0].metadata.source_url, "/a");
        assert!(hits[0].score > 0.99);
    }

    #[tokio::test]
    async fn results_are_ordered_most_similar_first_and_capped_at_k() {
        let dir = tempdir().unwrap();
        let store = SqliteVectorStore::open(dir.path().join("idx.sqlite"), "mock-hash", 4)
            .await
            .unwrap();

        store
            .upsert(record("a", "close", vec![1.0, 0.1, 0.0, 0.0], "/a"))
            .await
            .unwrap();
        store
            .upsert(record("b", "far", vec![0.0, 1.0, 0.0, 0.0], "/b"))
            .await
            .unwrap();
        store
            .upsert(record("c", "closest", vec![1.0, 0.0, 0.0, 0.0], "/c"))
            .await
            .unwrap();

        let hits = store.query(&[1.0, 0.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].content, "closest");
        assert_eq!(hits[1].content, "close");
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn upserting_same_id_twice_keeps_one_record_with_latest_value() {
        let dir = tempdir().unwrap();
        let store = SqliteVectorStore::open(dir.path().join("idx.sqlite"), "mock-hash", 4)
            .await
            .unwrap();

        store
            .upsert(record("a", "first", vec![1.0, 0.0, 0.0, 0.0], "/a"))
            .await
            .unwrap();
        store
            .upsert(record("a", "second", vec![0.9, 0.1, 0.0, 0.0], "/a"))
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let hits = store.query(&[0.9, 0.1, 0.0, 0.0], 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "second");
    }

    #[tokio::test]
    async fn wrong_dimension_upsert_is_rejected() {
        let dir = tempdir().unwrap();
        let store = SqliteVectorStore::open(dir.path().join("idx.sqlite"), "mock-hash", 4)
            .await
            .unwrap();

        match store.upsert(record("a", "bad", vec![1.0, 0.0], "/a")).await {
            Err(RagError::Dimension { got: 2, want: 4 }) => {}
            other => panic!("expected dimension error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reopening_with_a_different_model_fails_fast() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("idx.sqlite");

        let store = SqliteVectorStore::open(&path, "mock-hash", 4).await.unwrap();
        drop(store);

        // Same identity reopens fine.
        let store = SqliteVectorStore::open(&path, "mock-hash", 4).await.unwrap();
        drop(store);

        match SqliteVectorStore::open(&path, "all-MiniLM-L6-v2", 384).await {
            Err(RagError::ModelMismatch { stored, active, .. }) => {
                assert_eq!(stored, "mock-hash");
                assert_eq!(active, "all-MiniLM-L6-v2");
            }
            other => panic!("expected model mismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn metadata_round_trips_through_the_metadata_column() {
        let dir = tempdir().unwrap();
        let store = SqliteVectorStore::open(dir.path().join("idx.sqlite"), "mock-hash", 4)
            .await
            .unwrap();

        let mut metadata = ChunkMetadata::for_source("/about");
        metadata.section = Some("bio".to_string());
        metadata
            .extra
            .insert("chunk_index".to_string(), serde_json::json!(2));

        store
            .upsert(ChunkRecord {
                id: "a".to_string(),
                content: "text".to_string(),
                embedding: vec![1.0, 0.0, 0.0, 0.0],
                metadata: metadata.clone(),
            })
            .await
            .unwrap();

        let hits = store.query(&[1.0, 0.0, 0.0, 0.0], 1).await.unwrap();
        assert_eq!(hits[0].metadata, metadata);
    }
}
