//! Read-path demo: retrieve grounding context for a question from the
//! persisted index and print the assembled prompt.

use std::env;
use std::sync::Arc;

use tracing_subscriber::FmtSubscriber;

use portfolio_rag::RagConfig;
use portfolio_rag::embeddings::{EmbeddingProvider, RemoteEmbeddingProvider};
use portfolio_rag::generation::{FALLBACK_ANSWER, build_prompt};
use portfolio_rag::retriever::Retriever;
use portfolio_rag::stores::{SqliteVectorStore, VectorStore};
use portfolio_rag::types::RagError;

#[tokio::main]
async fn main() -> Result<(), RagError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let question = env::args().skip(1).collect::<Vec<_>>().join(" ");
    if question.trim().is_empty() {
        return Err(RagError::Config(
            "usage: ask <question about the portfolio>".to_string(),
        ));
    }

    let config = RagConfig::from_env()?;

    let provider: Arc<dyn EmbeddingProvider> = Arc::new(RemoteEmbeddingProvider::new(
        &config.embedding_endpoint,
        &config.embedding_model,
        config.embedding_dimensions,
        config.embedding_api_key.as_deref(),
        config.http_timeout,
    )?);

    let store = Arc::new(
        SqliteVectorStore::open(&config.db_path, provider.model_id(), provider.dimensions())
            .await?,
    );

    let retriever = Retriever::new(
        provider,
        Arc::clone(&store) as Arc<dyn VectorStore>,
        config.top_k,
    );

    let context = retriever.retrieve_context(&question).await?;
    if context.is_empty() {
        println!("{FALLBACK_ANSWER}");
        return Ok(());
    }

    println!("{}", build_prompt(&context, &question));
    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let subscriber = FmtSubscriber::builder().with_env_filter("info").finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
