//! External process execution with a deadline.
//!
//! [`run_with_timeout`] owns the child for its whole life: stdin is written
//! and closed while stdout and stderr are drained, the exchange is bounded by
//! the deadline, and on timeout the child is killed and reaped before the
//! function returns. Children are spawned with `kill_on_drop`, so dropping
//! the future (a cancelled request) also kills the child.
//!
//! Command lines come from configuration as [`CommandTemplate`]s: the line is
//! split with shell-words first, then `{var}` placeholders are substituted in
//! each argument, so substituted paths never need quoting.

use crate::error::{DocfillError, Result};
use crate::vars::{self, VarsError};
use std::collections::{BTreeSet, HashMap};
use std::io;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// A configured command line with `{var}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    source: String,
    tokens: Vec<String>,
}

impl CommandTemplate {
    /// Split a command line into arguments.
    pub fn parse(command: &str) -> Result<Self> {
        let tokens = shell_words::split(command).map_err(|e| {
            DocfillError::Configuration(format!(
                "failed to parse command '{}': {}\n\
                 Fix: check for unmatched quotes or invalid escape sequences.",
                command, e
            ))
        })?;
        if tokens.is_empty() {
            return Err(DocfillError::Configuration(format!(
                "command is empty after parsing: '{}'",
                command
            )));
        }
        for token in &tokens {
            vars::referenced(token).map_err(|e| template_error(command, e))?;
        }
        Ok(Self {
            source: command.to_string(),
            tokens,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Program name (first argument, before substitution).
    pub fn program(&self) -> &str {
        &self.tokens[0]
    }

    /// Fail unless every name in `required` appears as a placeholder.
    pub fn require(&self, required: &[&str]) -> Result<()> {
        let referenced: BTreeSet<String> = self
            .tokens
            .iter()
            .filter_map(|t| vars::referenced(t).ok())
            .flatten()
            .collect();
        for name in required {
            if !referenced.contains(*name) {
                return Err(DocfillError::Configuration(format!(
                    "command '{}' must reference {{{}}}",
                    self.source, name
                )));
            }
        }
        Ok(())
    }

    /// Substitute variables into every argument.
    pub fn render(&self, variables: &HashMap<&str, String>) -> Result<Vec<String>> {
        self.tokens
            .iter()
            .map(|token| {
                vars::substitute(token, variables).map_err(|e| template_error(&self.source, e))
            })
            .collect()
    }
}

fn template_error(command: &str, err: VarsError) -> DocfillError {
    DocfillError::Configuration(format!("invalid command template '{}': {}", command, err))
}

/// One external process run.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Program followed by its arguments.
    pub argv: Vec<String>,
    pub working_dir: PathBuf,
    /// Bytes written to the child's stdin before it is closed.
    pub stdin: Vec<u8>,
    pub timeout: Duration,
    /// Start the child with an empty environment except for `PATH`.
    pub isolate_env: bool,
}

/// How a run ended.
#[derive(Debug)]
pub enum Outcome {
    /// The child exited on its own; stdout and stderr were fully drained.
    Completed(Output),
    /// The deadline passed; the child has been killed and reaped.
    TimedOut,
}

/// Run `invocation` to completion or until its deadline.
///
/// Spawn and pipe failures are returned as I/O errors; callers map them to
/// their own error variant.
pub async fn run_with_timeout(invocation: &Invocation) -> io::Result<Outcome> {
    let (program, args) = invocation
        .argv
        .split_first()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;

    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(&invocation.working_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if invocation.isolate_env {
        command.env_clear();
        if let Some(path) = std::env::var_os("PATH") {
            command.env("PATH", path);
        }
    }

    let mut child = command.spawn()?;
    debug!(program = %program, pid = ?child.id(), "spawned child process");

    let result = tokio::time::timeout(invocation.timeout, exchange(&mut child, &invocation.stdin)).await;
    match result {
        Ok(output) => output.map(Outcome::Completed),
        Err(_) => {
            // kill() sends SIGKILL and waits, so the child is reaped here.
            if let Err(e) = child.kill().await {
                warn!(program = %program, error = %e, "failed to kill timed out child");
            }
            Ok(Outcome::TimedOut)
        }
    }
}

async fn exchange(child: &mut Child, input: &[u8]) -> io::Result<Output> {
    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let write = async move {
        if let Some(mut pipe) = stdin {
            match pipe.write_all(input).await {
                // The child may exit without reading its input.
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                other => other?,
            }
        }
        Ok::<(), io::Error>(())
    };

    let ((), stdout, stderr) = tokio::try_join!(write, drain(stdout), drain(stderr))?;
    let status = child.wait().await?;
    Ok(Output {
        status,
        stdout,
        stderr,
    })
}

async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}
