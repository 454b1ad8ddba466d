//! In-process sentence-embedding inference via rust-bert.
//!
//! Gated behind the `local-model` feature because the backing libtorch
//! runtime is a heavyweight build-time requirement.

use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use async_trait::async_trait;
use rust_bert::pipelines::sentence_embeddings::SentenceEmbeddingsBuilder;
use tokio::sync::{OnceCell, oneshot};

use super::EmbeddingProvider;
use crate::types::RagError;

type EmbedRequest = (String, oneshot::Sender<Result<Vec<f32>, String>>);

/// Embeds text with a pretrained all-MiniLM-L6-v2 model loaded from a local
/// directory.
///
/// The model is loaded lazily on first use, on a dedicated worker thread
/// that owns it for the remainder of the process; the guarded [`OnceCell`]
/// ensures exactly one load even under concurrent first use. A load failure
/// is surfaced as [`RagError::Provider`] and should be treated as fatal by
/// the composition root — there is no degraded mode.
///
/// The reported `model_id` is the conceptual model, not the directory, so
/// an index built here stays compatible with the remote variant serving the
/// same model.
pub struct LocalEmbeddingProvider {
    model_dir: PathBuf,
    worker: OnceCell<mpsc::Sender<EmbedRequest>>,
}

impl LocalEmbeddingProvider {
    /// `model_dir` must hold an exported all-MiniLM-L6-v2 sentence-embedding
    /// model in rust-bert's on-disk layout.
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            worker: OnceCell::new(),
        }
    }

    async fn worker(&self) -> Result<&mpsc::Sender<EmbedRequest>, RagError> {
        let model_dir = self.model_dir.clone();
        self.worker
            .get_or_try_init(|| async move { spawn_model_worker(model_dir) })
            .await
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbeddingProvider {
    fn model_id(&self) -> &str {
        "sentence-transformers/all-MiniLM-L6-v2"
    }

    fn dimensions(&self) -> usize {
        384
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let sender = self.worker().await?;
        let (reply_tx, reply_rx) = oneshot::channel();
        sender
            .send((text.to_string(), reply_tx))
            .map_err(|_| RagError::Provider("embedding worker has shut down".to_string()))?;
        reply_rx
            .await
            .map_err(|_| RagError::Provider("embedding worker dropped the request".to_string()))?
            .map_err(RagError::Provider)
    }
}

/// Loads the model on a fresh thread and hands back its request channel.
///
/// The load is confirmed synchronously so a broken install fails the first
/// `embed` call instead of poisoning later ones.
fn spawn_model_worker(model_dir: PathBuf) -> Result<mpsc::Sender<EmbedRequest>, RagError> {
    let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();
    let (request_tx, request_rx) = mpsc::channel::<EmbedRequest>();

    thread::Builder::new()
        .name("local-embedder".to_string())
        .spawn(move || {
            let model = match SentenceEmbeddingsBuilder::local(model_dir).create_model() {
                Ok(model) => {
                    let _ = ready_tx.send(Ok(()));
                    model
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err.to_string()));
                    return;
                }
            };

            while let Ok((text, reply)) = request_rx.recv() {
                let result = model
                    .encode(&[text])
                    .map_err(|err| err.to_string())
                    .and_then(|mut vectors| {
                        vectors
                            .pop()
                            .ok_or_else(|| "model returned no embedding".to_string())
                    });
                let _ = reply.send(result);
            }
        })
        .map_err(|err| RagError::Provider(format!("failed to spawn embedding worker: {err}")))?;

    ready_rx
        .recv()
        .map_err(|_| RagError::Provider("embedding worker exited before loading".to_string()))?
        .map_err(|err| RagError::Provider(format!("failed to load local model: {err}")))?;

    Ok(request_tx)
}
