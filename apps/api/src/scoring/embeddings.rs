//! Embedding capability used for keyword relevance.
//!
//! `FastEmbedder` is the default: all-MiniLM-L6-v2 run locally, so scoring
//! makes no network call. `HttpEmbedder` talks to an OpenAI-compatible
//! `/v1/embeddings` endpoint, is enabled when an embeddings API key is
//! configured, and retries transient failures with the completion policy.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::{retry_with_backoff, RetryPolicy};

pub const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";
const EMBEDDING_MODEL: &str = "text-embedding-3-small";
/// Roughly 8k tokens.
const MAX_EMBED_CHARS: usize = 30_000;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Embedding HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("No embedding in response")]
    EmptyResponse,

    #[error("Embedding model error: {0}")]
    Model(String),
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Cosine similarity in [-1, 1]. Mismatched, empty or zero-magnitude vectors yield 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    (dot_product / (magnitude_a * magnitude_b)).clamp(-1.0, 1.0)
}

// ────────────────────────────────────────────────────────────────────────────
// FastEmbedder
// ────────────────────────────────────────────────────────────────────────────

/// Local sentence embeddings (all-MiniLM-L6-v2, 384 dimensions) via ONNX.
/// The model is loaded once; inference runs on the blocking pool.
#[derive(Clone)]
pub struct FastEmbedder {
    model: Arc<TextEmbedding>,
}

impl FastEmbedder {
    /// Loads the model from `cache_dir`, downloading it on first use.
    /// Blocking; call from `spawn_blocking` inside a runtime.
    pub fn load(cache_dir: PathBuf) -> Result<Self, EmbeddingError> {
        let mut options = InitOptions::new(EmbeddingModel::AllMiniLML6V2);
        options.show_download_progress = false;
        options.cache_dir = cache_dir;

        let model =
            TextEmbedding::try_new(options).map_err(|e| EmbeddingError::Model(e.to_string()))?;
        Ok(Self {
            model: Arc::new(model),
        })
    }
}

#[async_trait]
impl Embedder for FastEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let model = self.model.clone();
        let input = crate::completion::service::truncate_chars(text, MAX_EMBED_CHARS).to_string();

        let embeddings = tokio::task::spawn_blocking(move || model.embed(vec![input], None))
            .await
            .map_err(|e| EmbeddingError::Model(e.to_string()))?
            .map_err(|e| EmbeddingError::Model(e.to_string()))?;

        embeddings
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or(EmbeddingError::EmptyResponse)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HttpEmbedder
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
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

#[derive(Clone)]
pub struct HttpEmbedder {
    client: Client,
    api_key: Secret<String>,
    url: String,
    retry: RetryPolicy,
}

impl HttpEmbedder {
    pub fn new(
        api_key: Secret<String>,
        url: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, EmbeddingError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            url: url.into(),
            retry,
        })
    }

    /// One request, no retry.
    async fn embed_once(&self, input: &str) -> Result<Vec<f32>, EmbeddingError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&EmbeddingRequest {
                model: EMBEDDING_MODEL,
                input,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: EmbeddingResponse = response.json().await?;
        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or(EmbeddingError::EmptyResponse)
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let input = crate::completion::service::truncate_chars(text, MAX_EMBED_CHARS);
        retry_with_backoff(self.retry, || self.embed_once(input)).await
    }
}
