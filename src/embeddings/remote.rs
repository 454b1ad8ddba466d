//! Embedding provider backed by a remote inference endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::EmbeddingProvider;
use crate::types::RagError;

/// Talks to an OpenAI-style `/embeddings` endpoint.
///
/// Payload is `{"model": ..., "input": ...}`; the response is expected to
/// carry `{"data": [{"embedding": [...]}]}`. The returned vector is surfaced
/// verbatim — a failed call is an error, never a silent zero-vector.
///
/// Transport failures and timeouts map to [`RagError::ProviderUnavailable`];
/// non-2xx statuses and malformed or mis-sized bodies map to
/// [`RagError::Provider`]. No retries are attempted: during ingestion the
/// pipeline skips the chunk and continues, at query time the error reaches
/// the caller.
#[derive(Clone)]
pub struct RemoteEmbeddingProvider {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: usize,
}

impl RemoteEmbeddingProvider {
    /// Builds a provider with a bounded per-request timeout.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, RagError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(key) = api_key {
            let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", key.trim()))
                .map_err(|err| RagError::Config(format!("invalid embedding api key: {err}")))?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .use_rustls_tls()
            .build()
            .map_err(|err| RagError::Config(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            dimensions,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbeddingProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(RagError::Provider(format!(
                "embedding request failed ({status}): {body}"
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|err| RagError::Provider(format!("malformed embedding response: {err}")))?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|entry| entry.embedding)
            .ok_or_else(|| RagError::Provider("embedding response carried no data".to_string()))?;

        if vector.len() != self.dimensions {
            return Err(RagError::Provider(format!(
                "model {} returned {} dimensions, expected {}",
                self.model,
                vector.len(),
                self.dimensions
            )));
        }

        Ok(vector)
    }
}

fn classify_transport_error(err: reqwest::Error) -> RagError {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        RagError::ProviderUnavailable(err.to_string())
    } else {
        RagError::Provider(err.to_string())
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}
