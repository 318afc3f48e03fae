//! Append-only audit log.
//!
//! Uploads, rule generations and rule removals are recorded in NDJSON format
//! (one JSON object per line) in `<data_dir>/events/events.ndjson`.
//!
//! # Event Format
//!
//! Each event is a JSON object with the following fields:
//! - `ts`: RFC3339 timestamp
//! - `action`: The action performed (upload, rule_generate, rule_remove)
//! - `actor`: The owner string (e.g., `user@HOST`)
//! - `document`: Optional document id
//! - `tag`: Optional placeholder tag
//! - `details`: Freeform object with action-specific details
//!
//! The log is informational: [`record`] downgrades write failures to a
//! warning so the operation being logged still succeeds.

use crate::context::Workspace;
use crate::error::{DocfillError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use tracing::warn;

/// Actions that can be logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// Template and data file stored
    Upload,
    /// Rule generated and stored
    RuleGenerate,
    /// Rule deleted
    RuleRemove,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::Upload => write!(f, "upload"),
            EventAction::RuleGenerate => write!(f, "rule_generate"),
            EventAction::RuleRemove => write!(f, "rule_remove"),
        }
    }
}

/// An event record for the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// RFC3339 timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    pub action: EventAction,

    /// The actor who performed the action (e.g., `user@HOST`).
    pub actor: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Freeform details object with action-specific information.
    pub details: Value,
}

impl Event {
    /// Create a new event stamped with the current time and actor.
    pub fn new(action: EventAction) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: get_actor_string(),
            document: None,
            tag: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.document = Some(document.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| DocfillError::Storage(format!("failed to serialize event to JSON: {}", e)))
    }
}

/// Get the actor string for event metadata.
fn get_actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Append an event to the events log, creating the file if needed.
pub fn append_event(workspace: &Workspace, event: &Event) -> Result<()> {
    let events_file = workspace.events_file();
    let json_line = event.to_ndjson_line()?;

    fs::create_dir_all(&workspace.events_dir).map_err(|e| {
        DocfillError::Storage(format!(
            "failed to create events directory '{}': {}",
            workspace.events_dir.display(),
            e
        ))
    })?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&events_file)
        .map_err(|e| {
            DocfillError::Storage(format!(
                "failed to open events file '{}': {}",
                events_file.display(),
                e
            ))
        })?;

    // One write per line keeps concurrent appends from interleaving.
    file.write_all(format!("{}\n", json_line).as_bytes())
        .map_err(|e| {
            DocfillError::Storage(format!(
                "failed to write event to '{}': {}",
                events_file.display(),
                e
            ))
        })?;

    Ok(())
}

/// Append an event, logging instead of failing.
pub fn record(workspace: &Workspace, event: Event) {
    if let Err(e) = append_event(workspace, &event) {
        warn!(action = %event.action, error = %e, "failed to record event");
    }
}

/// Read all events back, skipping lines that do not parse.
pub fn read_events(workspace: &Workspace) -> Result<Vec<Event>> {
    let events_file = workspace.events_file();
    let content = match fs::read_to_string(&events_file) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(DocfillError::Storage(format!(
                "failed to read events file '{}': {}",
                events_file.display(),
                e
            )));
        }
    };
    Ok(content
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect())
}
