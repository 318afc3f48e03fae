//! Client for OpenAI-compatible chat completion endpoints.

use super::{CompletionRequest, TextGenerator};
use crate::config::GeneratorConfig;
use crate::error::{DocfillError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Chat completion client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    base_url: String,
    model: String,
    api_key: String,
    client: Client,
}

impl OpenAiClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            DocfillError::Configuration(format!("failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            base_url,
            model: model.into(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Build a client from config, reading the credential from the
    /// environment variable named by `api_key_env`.
    ///
    /// Returns `Ok(None)` when that variable is unset or empty.
    pub fn from_config(config: &GeneratorConfig) -> Result<Option<Self>> {
        let api_key = match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => key,
            _ => return Ok(None),
        };
        Self::new(
            &config.base_url,
            &config.model,
            api_key.trim(),
            Duration::from_secs(config.request_timeout_seconds),
        )
        .map(Some)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: 0.0,
            max_tokens: request.max_tokens,
        };

        debug!(url = %url, model = %self.model, max_tokens = request.max_tokens, "requesting completion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DocfillError::Upstream("request timed out".to_string())
                } else {
                    DocfillError::Upstream(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DocfillError::Upstream(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(DocfillError::Upstream(format!(
                "HTTP {}: {}",
                status.as_u16(),
                message.trim()
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| DocfillError::Upstream(format!("malformed response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| DocfillError::Upstream("response contained no text".to_string()))
    }
}
