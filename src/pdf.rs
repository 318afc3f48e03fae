//! HTML to PDF conversion through an external renderer.
//!
//! The HTML is written to `input.html` in a private temporary directory, the
//! configured command is run with `{input}` and `{output}` substituted, and
//! the bytes of `output.pdf` are returned. Every failure is reported as
//! [`DocfillError::Conversion`].

use crate::config::PdfConfig;
use crate::error::{DocfillError, Result};
use crate::process::{self, CommandTemplate, Invocation, Outcome};
use crate::vars;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::{info, warn};

const INPUT_FILE: &str = "input.html";
const OUTPUT_FILE: &str = "output.pdf";

/// Runs the configured HTML-to-PDF command.
#[derive(Debug, Clone)]
pub struct PdfConverter {
    command: CommandTemplate,
    timeout: Duration,
}

impl PdfConverter {
    pub fn new(command: CommandTemplate, timeout: Duration) -> Self {
        Self { command, timeout }
    }

    pub fn from_config(config: &PdfConfig) -> Result<Self> {
        let command = CommandTemplate::parse(&config.command)?;
        command.require(&["input", "output"])?;
        Ok(Self::new(command, config.timeout()))
    }

    /// Convert `html` to PDF bytes.
    pub async fn convert(&self, html: &str) -> Result<Vec<u8>> {
        let workdir = TempDir::new()
            .map_err(|e| conversion(format!("failed to create working directory: {}", e)))?;
        let input = workdir.path().join(INPUT_FILE);
        let output = workdir.path().join(OUTPUT_FILE);

        tokio::fs::write(&input, html)
            .await
            .map_err(|e| conversion(format!("failed to write '{}': {}", input.display(), e)))?;

        let argv = self.command.render(&vars::vars([
            ("input", input.to_string_lossy().into_owned()),
            ("output", output.to_string_lossy().into_owned()),
        ]))?;

        let invocation = Invocation {
            argv,
            working_dir: workdir.path().to_path_buf(),
            stdin: Vec::new(),
            timeout: self.timeout,
            isolate_env: false,
        };

        let started = Instant::now();
        let outcome = process::run_with_timeout(&invocation).await.map_err(|e| {
            conversion(format!(
                "failed to run '{}': {}\nFix: install the PDF renderer or change pdf.command.",
                self.command.program(),
                e
            ))
        })?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Outcome::TimedOut => {
                warn!(elapsed_ms, "PDF renderer timed out and was killed");
                return Err(conversion(format!(
                    "renderer timed out after {}s",
                    self.timeout.as_secs_f64()
                )));
            }
            Outcome::Completed(out) if !out.status.success() => {
                let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
                warn!(elapsed_ms, status = %out.status, "PDF renderer failed");
                return Err(conversion(format!("renderer exited with {}: {}", out.status, stderr)));
            }
            Outcome::Completed(_) => {}
        }

        let pdf = tokio::fs::read(&output)
            .await
            .map_err(|e| conversion(format!("renderer produced no output file: {}", e)))?;
        info!(elapsed_ms, bytes = pdf.len(), "PDF generated");
        Ok(pdf)
    }
}

fn conversion(message: String) -> DocfillError {
    DocfillError::Conversion(message)
}
