//! Exit code constants for the docfill CLI.
//!
//! - 0: Success
//! - 1: User error (bad arguments, missing uploads, malformed data, unknown rule)
//! - 2: Configuration failure (missing credential, invalid config file)
//! - 3: Text-generation service failure
//! - 4: Rule execution failure (timeout or runtime error)
//! - 5: Local I/O or document conversion failure

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, missing uploads, malformed data, or unknown rule.
pub const USER_ERROR: i32 = 1;

/// Configuration failure: missing credential or invalid configuration.
pub const CONFIG_FAILURE: i32 = 2;

/// The text-generation service failed or returned unusable output.
pub const UPSTREAM_FAILURE: i32 = 3;

/// A rule artifact timed out or exited with an error.
pub const RULE_FAILURE: i32 = 4;

/// Storage or PDF conversion failure.
pub const IO_FAILURE: i32 = 5;
