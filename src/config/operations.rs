//! Config loading, lookup and validation.

use super::model::Config;
use crate::error::{DocfillError, Result};
use crate::process::CommandTemplate;
use crate::rules::prompt::{SYSTEM_PROMPT_VARS, USER_PROMPT_VARS, check_template};
use std::path::Path;
use tracing::debug;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "docfill.yaml";

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            DocfillError::Configuration(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Resolve the effective config.
    ///
    /// An explicit path must exist. Without one, `docfill.yaml` in the working
    /// directory is used if present, otherwise the built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            debug!(path = %path.display(), "loading config");
            return Self::load(path);
        }
        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            debug!(path = %fallback.display(), "loading config");
            return Self::load(fallback);
        }
        debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml).map_err(|e| {
            DocfillError::Configuration(format!("failed to parse config YAML: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - timeouts, token budget, concurrency, upload limit and port are positive
    /// - `executor.command` parses and references `{artifact}`
    /// - `pdf.command` parses and references `{input}` and `{output}`
    /// - prompt templates only reference their declared variables
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("server.port", self.server.port as u64),
            ("server.max_upload_bytes", self.server.max_upload_bytes as u64),
            ("generator.max_tokens", self.generator.max_tokens as u64),
            (
                "generator.request_timeout_seconds",
                self.generator.request_timeout_seconds,
            ),
            ("executor.timeout_seconds", self.executor.timeout_seconds),
            ("executor.max_concurrent", self.executor.max_concurrent as u64),
            ("pdf.timeout_seconds", self.pdf.timeout_seconds),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(invalid(format!("{} must be greater than 0", field)));
            }
        }

        if self.data_dir.as_os_str().is_empty() {
            return Err(invalid("data_dir must not be empty".to_string()));
        }
        if self.generator.api_key_env.trim().is_empty() {
            return Err(invalid("generator.api_key_env must not be empty".to_string()));
        }

        CommandTemplate::parse(&self.executor.command)
            .and_then(|c| c.require(&["artifact"]))
            .map_err(|e| invalid(format!("executor.command: {}", detail(e))))?;
        CommandTemplate::parse(&self.pdf.command)
            .and_then(|c| c.require(&["input", "output"]))
            .map_err(|e| invalid(format!("pdf.command: {}", detail(e))))?;

        check_template(
            "generator.system_prompt",
            &self.generator.system_prompt,
            SYSTEM_PROMPT_VARS,
        )
        .map_err(|e| invalid(detail(e)))?;
        check_template(
            "generator.user_prompt",
            &self.generator.user_prompt,
            USER_PROMPT_VARS,
        )
        .map_err(|e| invalid(detail(e)))?;

        Ok(())
    }
}

fn detail(err: DocfillError) -> String {
    match err {
        DocfillError::Configuration(message) => message,
        other => other.to_string(),
    }
}

fn invalid(message: String) -> DocfillError {
    DocfillError::Configuration(format!("config validation failed: {}", message))
}
