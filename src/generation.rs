//! Generation client for question condensing and grounded answering.
//!
//! Defines the [`Generator`] trait and the [`OpenAiGenerator`]
//! implementation over the chat-completions API. Unlike the embedding
//! client, generation calls are never retried silently — a failed call
//! surfaces as `Upstream`/`Timeout` and the caller decides whether to pay
//! for another attempt.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::config::{GenerationConfig, HttpConfig};
use crate::embedding::{build_http_client, classify_transport_error};
use crate::error::{ChatError, Result};

/// Produces a text completion for a single prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Generation client for the OpenAI `POST /v1/chat/completions` endpoint.
///
/// Requires the `OPENAI_API_KEY` environment variable. Shares the `[http]`
/// proxy configuration with the embedding client.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    temperature: f32,
}

impl OpenAiGenerator {
    pub fn new(config: &GenerationConfig, http: &HttpConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ChatError::InvalidRequest("OPENAI_API_KEY not set".to_string()))?;

        let client = build_http_client(Duration::from_secs(config.timeout_secs), http)?;

        Ok(Self {
            client,
            api_key,
            api_base: config.api_base.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(ChatError::Upstream(format!(
                "chat completions API {}: {}",
                status, body_text
            )));
        }

        let parsed: CompletionsResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Upstream(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ChatError::Upstream("empty completion response".to_string()))
    }
}

#[derive(Deserialize)]
struct CompletionsResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: String,
}
