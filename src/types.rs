//! Shared error type for the ingestion and retrieval pipeline.

use thiserror::Error;

/// Errors surfaced by the crawl, embedding, storage, and retrieval layers.
///
/// Ingestion callers typically absorb per-page and per-chunk failures to
/// maximize coverage; query-time callers receive these variants directly so
/// the boundary layer can map them to a user-visible fallback instead of a
/// raw internal error.
#[derive(Debug, Error)]
pub enum RagError {
    /// A page could not be fetched or rendered. The crawl logs and skips the
    /// URL; the run continues.
    #[error("failed to fetch {url}: {message}")]
    Crawl { url: String, message: String },

    /// The embedding endpoint could not be reached (transport failure or
    /// timeout).
    #[error("embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The embedding provider answered but the response was unusable
    /// (non-2xx status, malformed body, wrong vector shape, model load
    /// failure).
    #[error("embedding provider error: {0}")]
    Provider(String),

    /// Vector store open/upsert/query failure.
    #[error("vector store error: {0}")]
    Storage(String),

    /// The persisted index was built with a different embedding model or
    /// dimension than the active provider. Querying across models is a
    /// correctness bug, so opening fails fast instead.
    #[error(
        "embedding model mismatch: index was built with {stored} ({stored_dims} dims), \
         active provider is {active} ({active_dims} dims)"
    )]
    ModelMismatch {
        stored: String,
        stored_dims: usize,
        active: String,
        active_dims: usize,
    },

    /// A record's embedding length does not match the index dimension.
    #[error("embedding has {got} dimensions, index expects {want}")]
    Dimension { got: usize, want: usize },

    /// A URL could not be parsed or resolved.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Environment configuration was missing or unparseable.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<url::ParseError> for RagError {
    fn from(err: url::ParseError) -> Self {
        RagError::InvalidUrl(err.to_string())
    }
}
