//! Text-generation collaborator.
//!
//! The rule generator talks to a chat-style completion API through the
//! [`TextGenerator`] trait. [`OpenAiClient`] implements it against any
//! OpenAI-compatible `/chat/completions` endpoint.

mod openai;

pub use openai::OpenAiClient;

use crate::error::Result;
use async_trait::async_trait;

/// One completion call: a system instruction, a user instruction and an
/// output-token budget. Sampling is always deterministic (temperature 0).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
}

/// A service that turns instructions into generated text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Return the generated text, or `Upstream` if the service fails.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}
