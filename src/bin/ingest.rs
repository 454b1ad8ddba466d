//! One-shot batch ingestion: crawl the configured site and populate the
//! persisted vector index.

use std::sync::Arc;

use tracing_subscriber::FmtSubscriber;
use url::Url;

use portfolio_rag::RagConfig;
use portfolio_rag::crawler::{Crawler, HttpRenderer};
use portfolio_rag::embeddings::{EmbeddingProvider, RemoteEmbeddingProvider};
use portfolio_rag::ingestion::IngestionPipeline;
use portfolio_rag::stores::{SqliteVectorStore, VectorStore};
use portfolio_rag::types::RagError;

#[tokio::main]
async fn main() -> Result<(), RagError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = RagConfig::from_env()?;
    let seed = Url::parse(&config.seed_url)?;

    let provider: Arc<dyn EmbeddingProvider> = Arc::new(RemoteEmbeddingProvider::new(
        &config.embedding_endpoint,
        &config.embedding_model,
        config.embedding_dimensions,
        config.embedding_api_key.as_deref(),
        config.http_timeout,
    )?);

    // The store records the provider identity; a later run against a
    // different model fails here instead of corrupting the index.
    let store = Arc::new(
        SqliteVectorStore::open(&config.db_path, provider.model_id(), provider.dimensions())
            .await?,
    );

    let renderer = Arc::new(HttpRenderer::new(config.http_timeout)?);
    let crawler = Crawler::new(renderer, config.min_page_chars);

    let pipeline = IngestionPipeline::new(
        crawler,
        Arc::clone(&provider),
        Arc::clone(&store) as Arc<dyn VectorStore>,
        config.chunk_size,
    );

    let report = pipeline.ingest(seed).await?;

    println!("Ingestion complete");
    println!("  pages indexed : {}", report.pages_indexed);
    println!("  pages skipped : {}", report.pages_skipped);
    println!("  chunks indexed: {}", report.chunks_indexed);
    println!("  chunks failed : {}", report.chunks_failed);
    println!("  index total   : {}", store.count().await?);
    println!("  database      : {}", config.db_path);

    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let subscriber = FmtSubscriber::builder().with_env_filter("info").finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
