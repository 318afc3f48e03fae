//! Data directory layout for docfill.
//!
//! Every operation resolves its on-disk state through a [`Workspace`], so the
//! CLI and the HTTP surface always agree on where uploads, rules and the
//! event log live:
//!
//! ```text
//! <data_dir>/
//! ├── uploads/<document>/{template.html,data.xml}
//! ├── rules/rule_<stem>.js
//! └── events/events.ndjson
//! ```

use crate::documents::DocumentStore;
use crate::error::{DocfillError, Result};
use crate::rules::RuleStore;
use std::path::{Path, PathBuf};

pub const UPLOADS_DIR: &str = "uploads";
pub const RULES_DIR: &str = "rules";
pub const EVENTS_DIR: &str = "events";

/// Resolved paths under the data directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub data_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub rules_dir: PathBuf,
    pub events_dir: PathBuf,
}

impl Workspace {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Self {
            uploads_dir: data_dir.join(UPLOADS_DIR),
            rules_dir: data_dir.join(RULES_DIR),
            events_dir: data_dir.join(EVENTS_DIR),
            data_dir,
        }
    }

    /// Create the directory tree if it does not exist yet.
    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.uploads_dir, &self.rules_dir, &self.events_dir] {
            std::fs::create_dir_all(dir).map_err(|e| {
                DocfillError::Storage(format!(
                    "failed to create directory '{}': {}",
                    dir.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    pub fn documents(&self) -> DocumentStore {
        DocumentStore::new(&self.uploads_dir)
    }

    pub fn rules(&self) -> RuleStore {
        RuleStore::new(&self.rules_dir)
    }

    pub fn events_file(&self) -> PathBuf {
        self.events_dir.join("events.ndjson")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_is_rooted_at_data_dir() {
        let ws = Workspace::new("/srv/docfill");
        assert_eq!(ws.uploads_dir, PathBuf::from("/srv/docfill/uploads"));
        assert_eq!(ws.rules_dir, PathBuf::from("/srv/docfill/rules"));
        assert_eq!(
            ws.events_file(),
            PathBuf::from("/srv/docfill/events/events.ndjson")
        );
        assert_eq!(ws.rules().dir(), Path::new("/srv/docfill/rules"));
        assert_eq!(ws.documents().root(), Path::new("/srv/docfill/uploads"));
    }

    #[test]
    fn test_ensure_creates_directories_idempotently() {
        let temp_dir = TempDir::new().unwrap();
        let ws = Workspace::new(temp_dir.path().join("data"));

        ws.ensure().unwrap();
        ws.ensure().unwrap();

        assert!(ws.uploads_dir.is_dir());
        assert!(ws.rules_dir.is_dir());
        assert!(ws.events_dir.is_dir());
    }

    #[test]
    fn test_ensure_reports_storage_errors() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("file");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = Workspace::new(&blocker).ensure().unwrap_err();
        assert!(matches!(err, DocfillError::Storage(_)));
    }
}
