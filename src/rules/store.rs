//! On-disk persistence of rule artifacts.
//!
//! Artifacts live in a single directory as `rule_<stem>.js`. The stem is the
//! tag with every character outside `[0-9A-Za-z_]` replaced by `_`, so a tag
//! can never escape the directory. When that replacement changed the tag, a
//! short hash of the original tag is appended, which keeps `a-b`, `a.b` and
//! `a_b` in separate files.
//!
//! Writes replace the whole file atomically; there is no versioning.

use super::harness;
use crate::error::{DocfillError, Result};
use crate::fs::atomic_write_file;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const MAX_TAG_LEN: usize = 128;
const FILE_PREFIX: &str = "rule_";
const FILE_SUFFIX: &str = ".js";

/// Replace every character outside `[0-9A-Za-z_]` with `_`.
pub fn sanitize_tag(tag: &str) -> String {
    tag.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// File stem for a tag: the sanitized tag, plus a hash suffix if sanitizing changed it.
pub fn artifact_stem(tag: &str) -> String {
    let safe = sanitize_tag(tag);
    if safe == tag {
        return safe;
    }
    let digest = Sha256::digest(tag.as_bytes());
    let suffix: String = digest.iter().take(4).map(|b| format!("{:02x}", b)).collect();
    format!("{}_{}", safe, suffix)
}

/// Reject tags that cannot name a rule.
pub fn validate_tag(tag: &str) -> Result<()> {
    if tag.trim().is_empty() {
        return Err(DocfillError::Validation("tag must not be empty".to_string()));
    }
    if tag.chars().count() > MAX_TAG_LEN {
        return Err(DocfillError::Validation(format!(
            "tag is longer than {} characters",
            MAX_TAG_LEN
        )));
    }
    if tag.chars().any(char::is_control) {
        return Err(DocfillError::Validation(
            "tag must not contain control characters".to_string(),
        ));
    }
    Ok(())
}

/// A stored artifact as reported by [`RuleStore::list`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StoredRule {
    pub tag: String,
    pub file: String,
}

/// Directory of rule artifacts keyed by tag.
#[derive(Debug, Clone)]
pub struct RuleStore {
    dir: PathBuf,
}

impl RuleStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the artifact for `tag`, whether or not it exists.
    pub fn path(&self, tag: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}{}", FILE_PREFIX, artifact_stem(tag), FILE_SUFFIX))
    }

    pub fn exists(&self, tag: &str) -> bool {
        self.path(tag).is_file()
    }

    /// Path of the artifact for `tag`, or `NotFound` if none is stored.
    pub fn require(&self, tag: &str) -> Result<PathBuf> {
        let path = self.path(tag);
        if path.is_file() {
            Ok(path)
        } else {
            Err(not_found(&path))
        }
    }

    /// Write (or silently replace) the artifact for `tag`.
    pub fn write(&self, tag: &str, artifact: &str) -> Result<PathBuf> {
        validate_tag(tag)?;
        let path = self.path(tag);
        atomic_write_file(&path, artifact)?;
        debug!(tag, path = %path.display(), bytes = artifact.len(), "rule artifact written");
        Ok(path)
    }

    /// Read the full artifact text for `tag`.
    pub fn read(&self, tag: &str) -> Result<String> {
        let path = self.path(tag);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_found(&path)),
            Err(e) => Err(DocfillError::Storage(format!(
                "failed to read rule file '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    /// Delete the artifact for `tag`.
    pub fn remove(&self, tag: &str) -> Result<PathBuf> {
        let path = self.path(tag);
        match fs::remove_file(&path) {
            Ok(()) => Ok(path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_found(&path)),
            Err(e) => Err(DocfillError::Storage(format!(
                "failed to remove rule file '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    /// All stored artifacts, sorted by file name.
    ///
    /// The tag is recovered from the artifact header; files without one are
    /// reported under their file stem.
    pub fn list(&self) -> Result<Vec<StoredRule>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(DocfillError::Storage(format!(
                    "failed to list rules directory '{}': {}",
                    self.dir.display(),
                    e
                )));
            }
        };

        let mut rules = Vec::new();
        for entry in entries.flatten() {
            let file = entry.file_name().to_string_lossy().into_owned();
            let Some(stem) = file
                .strip_prefix(FILE_PREFIX)
                .and_then(|rest| rest.strip_suffix(FILE_SUFFIX))
            else {
                continue;
            };
            let tag = fs::read_to_string(entry.path())
                .ok()
                .and_then(|text| harness::read_tag(&text))
                .unwrap_or_else(|| stem.to_string());
            rules.push(StoredRule { tag, file });
        }
        rules.sort_by(|a, b| a.file.cmp(&b.file));
        Ok(rules)
    }
}

fn not_found(path: &Path) -> DocfillError {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    DocfillError::NotFound(format!("Rule file not found: {}", name))
}
