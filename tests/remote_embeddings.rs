//! Remote embedding provider behavior against a mocked HTTP endpoint.

use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use tempfile::tempdir;

use portfolio_rag::embeddings::{EmbeddingProvider, RemoteEmbeddingProvider};
use portfolio_rag::retriever::Retriever;
use portfolio_rag::stores::{SqliteVectorStore, VectorStore};
use portfolio_rag::types::RagError;

const TIMEOUT: Duration = Duration::from_secs(5);

fn provider_for(server: &MockServer, dimensions: usize) -> RemoteEmbeddingProvider {
    RemoteEmbeddingProvider::new(
        server.url("/v1/embeddings"),
        "all-MiniLM-L6-v2",
        dimensions,
        Some("test-key"),
        TIMEOUT,
    )
    .unwrap()
}

#[tokio::test]
async fn returned_vector_is_surfaced_verbatim() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/embeddings")
            .header("authorization", "Bearer test-key")
            .json_body(json!({
                "model": "all-MiniLM-L6-v2",
                "input": "What languages does she know?",
            }));
        then.status(200).json_body(json!({
            "data": [{"embedding": [0.25, -0.5, 0.125, 1.0]}],
        }));
    });

    let provider = provider_for(&server, 4);
    let vector = provider
        .embed("What languages does she know?")
        .await
        .unwrap();

    mock.assert();
    assert_eq!(vector, vec![0.25, -0.5, 0.125, 1.0]);
}

#[tokio::test]
async fn non_2xx_response_is_a_provider_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/embeddings");
        then.status(500).body("upstream exploded");
    });

    let provider = provider_for(&server, 4);
    match provider.embed("anything").await {
        Err(RagError::Provider(message)) => assert!(message.contains("500")),
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_provider_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/embeddings");
        then.status(200).body("not json");
    });

    let provider = provider_for(&server, 4);
    match provider.embed("anything").await {
        Err(RagError::Provider(_)) => {}
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn mis_sized_vector_is_a_provider_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/embeddings");
        then.status(200).json_body(json!({
            "data": [{"embedding": [0.1, 0.2]}],
        }));
    });

    let provider = provider_for(&server, 4);
    match provider.embed("anything").await {
        Err(RagError::Provider(message)) => assert!(message.contains("dimensions")),
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_endpoint_is_provider_unavailable() {
    // Nothing listens on the discard port.
    let provider = RemoteEmbeddingProvider::new(
        "http://127.0.0.1:9/v1/embeddings",
        "all-MiniLM-L6-v2",
        4,
        None,
        Duration::from_millis(500),
    )
    .unwrap();

    match provider.embed("anything").await {
        Err(RagError::ProviderUnavailable(_)) => {}
        other => panic!("expected provider-unavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn query_time_endpoint_failure_surfaces_not_an_empty_context() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/embeddings");
        then.status(500);
    });

    let provider = Arc::new(provider_for(&server, 4));
    let dir = tempdir().unwrap();
    let store = Arc::new(
        SqliteVectorStore::open(
            dir.path().join("index.sqlite"),
            provider.model_id(),
            provider.dimensions(),
        )
        .await
        .unwrap(),
    );

    let retriever = Retriever::new(
        Arc::clone(&provider) as Arc<dyn EmbeddingProvider>,
        store as Arc<dyn VectorStore>,
        4,
    );

    match retriever.retrieve_context("What does she build?").await {
        Err(RagError::Provider(_)) => {}
        other => panic!("expected provider error, got {other:?}"),
    }
}
