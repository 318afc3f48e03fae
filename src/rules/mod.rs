//! Dynamic rules: generation, storage and execution of per-tag scripts.
//!
//! A rule resolves one placeholder that has no static value. It is produced
//! once by the [`RuleGenerator`] from a natural-language prompt, persisted by
//! the [`RuleStore`] as a self-contained artifact, and run on demand by the
//! [`RuleExecutor`] in an isolated interpreter process.

mod executor;
mod fence;
mod generator;
pub mod harness;
pub mod prompt;
mod store;


pub use executor::{RuleExecutor, RuleRunner};
pub use fence::strip_fences;
pub use generator::{GeneratedRule, RuleGenerator, check_request};
pub use harness::RuleArtifact;
pub use store::{RuleStore, StoredRule, artifact_stem, sanitize_tag, validate_tag};
