//! Runs stored rule artifacts against a data mapping.
//!
//! Each run gets a fresh private working directory and an environment with
//! nothing but `PATH`. The data mapping is sent as JSON on stdin and the
//! trimmed stdout is the result.

use super::harness::{EXIT_NO_FUNCTION, EXIT_RULE_ERROR};
use super::store::RuleStore;
use crate::config::ExecutorConfig;
use crate::data::DataMapping;
use crate::error::{DocfillError, Result};
use crate::process::{self, CommandTemplate, Invocation, Outcome};
use crate::vars;
use async_trait::async_trait;
use std::process::ExitStatus;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Resolves dynamic tags during rendering.
#[async_trait]
pub trait RuleRunner: Send + Sync {
    /// Whether an artifact is stored for `tag`.
    fn has_rule(&self, tag: &str) -> bool;

    /// Run the artifact for `tag` and return its output.
    async fn run(&self, tag: &str, data: &DataMapping) -> Result<String>;
}

/// Spawns the configured interpreter on stored artifacts.
#[derive(Debug, Clone)]
pub struct RuleExecutor {
    store: RuleStore,
    command: CommandTemplate,
    timeout: Duration,
}

impl RuleExecutor {
    pub fn new(store: RuleStore, command: CommandTemplate, timeout: Duration) -> Self {
        Self {
            store,
            command,
            timeout,
        }
    }

    pub fn from_config(store: RuleStore, config: &ExecutorConfig) -> Result<Self> {
        let command = CommandTemplate::parse(&config.command)?;
        command.require(&["artifact"])?;
        Ok(Self::new(store, command, config.timeout()))
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute the artifact stored for `tag`.
    pub async fn execute(&self, tag: &str, data: &DataMapping) -> Result<String> {
        let stored = self.store.require(tag)?;
        // The child runs elsewhere, so relative data dirs must be resolved first.
        let artifact = std::fs::canonicalize(&stored).map_err(|e| {
            DocfillError::Storage(format!(
                "failed to resolve rule file '{}': {}",
                stored.display(),
                e
            ))
        })?;

        let argv = self.command.render(&vars::vars([(
            "artifact",
            artifact.to_string_lossy().into_owned(),
        )]))?;

        let workdir = TempDir::new().map_err(|e| {
            DocfillError::Storage(format!("failed to create rule working directory: {}", e))
        })?;

        let invocation = Invocation {
            argv,
            working_dir: workdir.path().to_path_buf(),
            stdin: data.to_json().into_bytes(),
            timeout: self.timeout,
            isolate_env: true,
        };

        let started = Instant::now();
        let outcome = process::run_with_timeout(&invocation).await.map_err(|e| {
            DocfillError::Execution {
                status: "not started".to_string(),
                stderr: format!(
                    "failed to run '{}': {}\nFix: ensure the interpreter is installed and in PATH.",
                    self.command.program(),
                    e
                ),
            }
        })?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Outcome::TimedOut => {
                warn!(tag, elapsed_ms, "rule timed out and was killed");
                Err(DocfillError::Timeout(self.timeout))
            }
            Outcome::Completed(output) if output.status.success() => {
                let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
                info!(tag, elapsed_ms, bytes = value.len(), "rule executed");
                debug!(tag, value = %value, "rule output");
                Ok(value)
            }
            Outcome::Completed(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                let status = describe(output.status);
                warn!(tag, elapsed_ms, status = %status, "rule failed");
                Err(DocfillError::Execution { status, stderr })
            }
        }
    }
}

#[async_trait]
impl RuleRunner for RuleExecutor {
    fn has_rule(&self, tag: &str) -> bool {
        self.store.exists(tag)
    }

    async fn run(&self, tag: &str, data: &DataMapping) -> Result<String> {
        self.execute(tag, data).await
    }
}

fn describe(status: ExitStatus) -> String {
    match status.code() {
        Some(EXIT_NO_FUNCTION) => format!("exit code {}, no entry point found", EXIT_NO_FUNCTION),
        Some(EXIT_RULE_ERROR) => format!("exit code {}, rule raised an error", EXIT_RULE_ERROR),
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}
