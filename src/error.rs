//! Error types for docfill.
//!
//! Uses thiserror for derive macros. Every variant knows the HTTP status and
//! CLI exit code it is reported with, so both boundaries convert errors the
//! same way.

use crate::exit_codes;
use std::time::Duration;
use thiserror::Error;

/// Main error type for docfill operations.
#[derive(Error, Debug)]
pub enum DocfillError {
    /// A required external setting (credential, command, config file) is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The request is missing required fields or refers to files that were never uploaded.
    #[error("{0}")]
    Validation(String),

    /// The structured data file is not well-formed markup.
    #[error("Failed to parse structured data: {0}")]
    Parse(String),

    /// The text-generation service failed, timed out, or returned unusable output.
    #[error("Text generation failed: {0}")]
    Upstream(String),

    /// A rule artifact exceeded its wall-clock budget and was killed.
    #[error("Rule timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// A rule artifact could not be started, exited non-zero, or threw.
    #[error("Rule execution failed ({status}): {stderr}")]
    Execution { status: String, stderr: String },

    /// The requested rule or document does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The external PDF renderer failed.
    #[error("PDF conversion failed: {0}")]
    Conversion(String),

    /// Reading or writing local state failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl DocfillError {
    /// Returns the CLI exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            DocfillError::Validation(_) | DocfillError::Parse(_) | DocfillError::NotFound(_) => {
                exit_codes::USER_ERROR
            }
            DocfillError::Configuration(_) => exit_codes::CONFIG_FAILURE,
            DocfillError::Upstream(_) => exit_codes::UPSTREAM_FAILURE,
            DocfillError::Timeout(_) | DocfillError::Execution { .. } => exit_codes::RULE_FAILURE,
            DocfillError::Conversion(_) | DocfillError::Storage(_) => exit_codes::IO_FAILURE,
        }
    }

    /// Returns the HTTP status code this error is reported with.
    pub fn status_code(&self) -> u16 {
        match self {
            DocfillError::Validation(_) | DocfillError::Parse(_) => 400,
            DocfillError::NotFound(_) => 404,
            DocfillError::Configuration(_)
            | DocfillError::Upstream(_)
            | DocfillError::Timeout(_)
            | DocfillError::Execution { .. }
            | DocfillError::Conversion(_)
            | DocfillError::Storage(_) => 500,
        }
    }

    /// Stable machine-readable label for the JSON error envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            DocfillError::Configuration(_) => "configuration",
            DocfillError::Validation(_) => "validation",
            DocfillError::Parse(_) => "parse",
            DocfillError::Upstream(_) => "upstream",
            DocfillError::Timeout(_) => "timeout",
            DocfillError::Execution { .. } => "execution",
            DocfillError::NotFound(_) => "not_found",
            DocfillError::Conversion(_) => "conversion",
            DocfillError::Storage(_) => "storage",
        }
    }
}

/// Result type alias for docfill operations.
pub type Result<T> = std::result::Result<T, DocfillError>;
