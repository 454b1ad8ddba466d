//! Environment-driven configuration for the ingestion and retrieval paths.
//!
//! Binaries load a `.env` file via `dotenvy` before calling
//! [`RagConfig::from_env`]; the library itself never reads the environment
//! implicitly. The resulting value is built once at the composition root and
//! handed to the components that need it.

use std::env;
use std::time::Duration;

use crate::chunker::DEFAULT_CHUNK_SIZE;
use crate::types::RagError;

/// Minimum extracted-text length for a page to be considered meaningful.
pub const DEFAULT_MIN_PAGE_CHARS: usize = 200;

/// Default number of chunks assembled into retrieval context.
pub const DEFAULT_TOP_K: usize = 4;

/// Runtime settings shared by the `ingest` and `ask` entry points.
#[derive(Clone, Debug)]
pub struct RagConfig {
    /// Seed URL the crawl starts from.
    pub seed_url: String,
    /// Path of the persisted SQLite vector index.
    pub db_path: String,
    /// Word-window size used by the chunker.
    pub chunk_size: usize,
    /// Pages with less visible text than this are skipped during ingestion.
    pub min_page_chars: usize,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Remote embedding endpoint (OpenAI-style `/embeddings` payloads).
    pub embedding_endpoint: String,
    /// Embedding model identifier, recorded in the index metadata.
    pub embedding_model: String,
    /// Expected embedding dimension for the configured model.
    pub embedding_dimensions: usize,
    /// Optional bearer token for the embedding endpoint.
    pub embedding_api_key: Option<String>,
    /// Upper bound on any single outbound HTTP call.
    pub http_timeout: Duration,
}

impl RagConfig {
    /// Reads configuration from the process environment, applying the
    /// defaults of the original portfolio deployment where a variable is
    /// unset.
    pub fn from_env() -> Result<Self, RagError> {
        let seed_url =
            env::var("PORTFOLIO_SEED_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());
        let db_path =
            env::var("PORTFOLIO_DB_PATH").unwrap_or_else(|_| "./portfolio_index.sqlite".to_string());
        let embedding_endpoint = env::var("EMBEDDING_ENDPOINT")
            .unwrap_or_else(|_| "http://localhost:8080/v1/embeddings".to_string());
        let embedding_model = env::var("EMBEDDING_MODEL")
            .unwrap_or_else(|_| "sentence-transformers/all-MiniLM-L6-v2".to_string());
        let embedding_api_key = env::var("EMBEDDING_API_KEY").ok();

        Ok(Self {
            seed_url,
            db_path,
            chunk_size: parse_var("PORTFOLIO_CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            min_page_chars: parse_var("PORTFOLIO_MIN_PAGE_CHARS", DEFAULT_MIN_PAGE_CHARS)?,
            top_k: parse_var("PORTFOLIO_TOP_K", DEFAULT_TOP_K)?,
            embedding_endpoint,
            embedding_model,
            embedding_dimensions: parse_var("EMBEDDING_DIMENSIONS", 384)?,
            embedding_api_key,
            http_timeout: Duration::from_secs(parse_var("PORTFOLIO_HTTP_TIMEOUT_SECS", 20u64)?),
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, RagError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| RagError::Config(format!("{name}={raw}: {err}"))),
        Err(_) => Ok(default),
    }
}
