//! Configuration sections and their defaults.

use crate::rules::prompt::{DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_PROMPT};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP surface settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body, multipart uploads included.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Text-generation service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`).
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub max_tokens: u32,
    pub request_timeout_seconds: u64,
    /// Default number of data entries sent as the sample.
    pub example_limit: usize,
    pub system_prompt: String,
    pub user_prompt: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_tokens: 800,
            request_timeout_seconds: 60,
            example_limit: 10,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            user_prompt: DEFAULT_USER_PROMPT.to_string(),
        }
    }
}

/// Rule execution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Interpreter command line; `{artifact}` is the rule file path.
    pub command: String,
    pub timeout_seconds: u64,
    /// Dynamic rules run in parallel during one render.
    pub max_concurrent: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            command: "node {artifact}".to_string(),
            timeout_seconds: 10,
            max_concurrent: 4,
        }
    }
}

impl ExecutorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// PDF conversion settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Converter command line; `{input}` is the HTML file, `{output}` the PDF.
    pub command: String,
    pub timeout_seconds: u64,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            command: "wkhtmltopdf --quiet {input} {output}".to_string(),
            timeout_seconds: 60,
        }
    }
}

impl PdfConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

pub fn default_data_dir() -> std::path::PathBuf {
    std::path::PathBuf::from(".docfill")
}
