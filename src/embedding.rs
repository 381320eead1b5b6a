//! Embedding client and vector utilities.
//!
//! Defines the [`Embedder`] trait and the [`OpenAiEmbedder`] implementation,
//! which calls the OpenAI embeddings API with batching, retry, and backoff.
//! An optional proxy URL from `[http]` config is applied to every outbound
//! call.
//!
//! Also provides vector helpers used by the index store:
//! - [`cosine_similarity`] — similarity between two embedding vectors
//! - [`vec_to_blob`] / [`blob_to_vec`] — little-endian f32 encoding for the
//!   on-disk vector artifact
//!
//! # Retry Strategy
//!
//! Transient errors use exponential backoff:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! A batch either returns one vector per input, in input order, or fails as
//! a whole; partial results are never exposed.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::config::{EmbeddingConfig, HttpConfig};
use crate::error::{ChatError, Result};

/// Maps text to fixed-length vectors. Implementations must be
/// order-preserving and dimensionally consistent.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query string.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let vectors = self.embed(&[text.to_string()]).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| ChatError::Upstream("empty embedding response".to_string()))
    }

    /// Vector dimensionality produced by this embedder.
    fn dims(&self) -> usize;
}

/// Embedding client for the OpenAI `POST /v1/embeddings` endpoint.
///
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    dims: usize,
    batch_size: usize,
    max_retries: u32,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig, http: &HttpConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ChatError::InvalidRequest("OPENAI_API_KEY not set".to_string()))?;

        let client = build_http_client(Duration::from_secs(config.timeout_secs), http)?;

        Ok(Self {
            client,
            api_key,
            api_base: config.api_base.clone(),
            model: config.model.clone(),
            dims: config.dims,
            batch_size: config.batch_size,
            max_retries: config.max_retries,
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(format!("{}/embeddings", self.api_base))
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let parsed: EmbeddingsResponse = response
                            .json()
                            .await
                            .map_err(|e| ChatError::Upstream(e.to_string()))?;
                        return collect_embeddings(parsed, texts.len());
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    let err =
                        ChatError::Upstream(format!("embeddings API {}: {}", status, body_text));

                    // Rate limited or server error: retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err = Some(err);
                        continue;
                    }

                    // Other client errors are not retryable
                    return Err(err);
                }
                Err(e) => {
                    last_err = Some(classify_transport_error(e));
                    continue;
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| ChatError::Upstream("embedding failed after retries".to_string())))
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size.max(1)) {
            out.extend(self.embed_batch(batch).await?);
        }
        Ok(out)
    }

    fn dims(&self) -> usize {
        self.dims
    }
}

/// Build a reqwest client with the configured timeout and optional proxy.
/// Shared with the generation client so proxy settings apply uniformly.
pub fn build_http_client(timeout: Duration, http: &HttpConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().timeout(timeout);
    if let Some(proxy_url) = &http.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| ChatError::InvalidRequest(format!("invalid proxy URL: {}", e)))?;
        builder = builder.proxy(proxy);
    }
    builder
        .build()
        .map_err(|e| ChatError::Upstream(e.to_string()))
}

/// Distinguish timeouts from other transport failures so callers can apply
/// their own retry policy per kind.
pub fn classify_transport_error(e: reqwest::Error) -> ChatError {
    if e.is_timeout() {
        ChatError::Timeout(e.to_string())
    } else {
        ChatError::Upstream(e.to_string())
    }
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

fn collect_embeddings(parsed: EmbeddingsResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
    if parsed.data.len() != expected {
        return Err(ChatError::Upstream(format!(
            "embeddings API returned {} vectors for {} inputs",
            parsed.data.len(),
            expected
        )));
    }
    let mut data = parsed.data;
    // The API reports each vector's input position; restore input order.
    data.sort_by_key(|d| d.index);
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

/// Encode a float vector as little-endian f32 bytes, 4 bytes per element.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode little-endian f32 bytes back into a float vector.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Cosine similarity between two vectors, in `[-1.0, 1.0]`.
///
/// Returns `0.0` for empty vectors or vectors of different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
