//! Generates rule artifacts from natural-language prompts.

use super::fence::strip_fences;
use super::harness::RuleArtifact;
use super::prompt::render_prompts;
use super::store::{RuleStore, validate_tag};
use crate::config::GeneratorConfig;
use crate::data::DataMapping;
use crate::error::{DocfillError, Result};
use crate::llm::{CompletionRequest, TextGenerator};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// A freshly generated and stored rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedRule {
    pub tag: String,
    pub path: PathBuf,
    /// The generated body, without the runner harness.
    pub code: String,
}

/// Reject a generation request that is missing its tag or prompt.
pub fn check_request(tag: &str, prompt: &str) -> Result<()> {
    validate_tag(tag)?;
    if prompt.trim().is_empty() {
        return Err(DocfillError::Validation("prompt must not be empty".to_string()));
    }
    Ok(())
}

/// Prompts the text-generation service and stores the result.
pub struct RuleGenerator {
    client: Option<Arc<dyn TextGenerator>>,
    store: RuleStore,
    config: GeneratorConfig,
}

impl RuleGenerator {
    /// `client` is `None` when no credential is configured; generation then
    /// fails with `Configuration`.
    pub fn new(
        client: Option<Arc<dyn TextGenerator>>,
        store: RuleStore,
        config: GeneratorConfig,
    ) -> Self {
        Self {
            client,
            store,
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Default sample size when the caller does not give one.
    pub fn example_limit(&self) -> usize {
        self.config.example_limit
    }

    /// Generate, validate and store the rule for `tag`.
    ///
    /// Nothing is written unless the service returned a usable function.
    pub async fn generate(
        &self,
        tag: &str,
        prompt: &str,
        sample: &DataMapping,
    ) -> Result<GeneratedRule> {
        check_request(tag, prompt)?;
        let client = self.client.as_ref().ok_or_else(|| {
            DocfillError::Configuration(format!(
                "text generation service is not configured\nFix: set {} (a .env file is also read).",
                self.config.api_key_env
            ))
        })?;

        let prompts = render_prompts(
            &self.config.system_prompt,
            &self.config.user_prompt,
            tag,
            prompt,
            sample,
        )?;
        let request = CompletionRequest {
            system: prompts.system,
            user: prompts.user,
            max_tokens: self.config.max_tokens,
        };

        let started = Instant::now();
        let text = client.complete(&request).await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        debug!(tag, generated = %text, "raw completion");

        let body = strip_fences(&text);
        let artifact = RuleArtifact::new(tag, &body)?;
        let path = self.store.write(tag, &artifact.render())?;

        info!(
            tag,
            elapsed_ms,
            sample_size = sample.len(),
            path = %path.display(),
            "rule generated"
        );

        Ok(GeneratedRule {
            tag: tag.to_string(),
            path,
            code: artifact.body().to_string(),
        })
    }
}
