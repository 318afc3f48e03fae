//! Uploaded document pairs, keyed by document id.
//!
//! Each document is a directory under the uploads root holding the HTML
//! template and the XML data file:
//!
//! ```text
//! uploads/
//! └── <id>/
//!     ├── template.html
//!     └── data.xml
//! ```
//!
//! The XML is parsed before anything is written. Each file is replaced with
//! its own atomic rename, so a reader never sees a partially written file,
//! but a read between the two renames can pair new data with the previous
//! template.

use crate::data::{DataMapping, load_xml_file, parse_xml};
use crate::error::{DocfillError, Result};
use crate::fs::atomic_write;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// Id used when the caller does not name a document.
pub const DEFAULT_DOCUMENT: &str = "default";

const TEMPLATE_FILE: &str = "template.html";
const DATA_FILE: &str = "data.xml";
const MAX_ID_LEN: usize = 64;

/// Validated document identifier: `[A-Za-z0-9_-]{1,64}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn parse(raw: &str) -> Result<Self> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_ID_LEN
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(DocfillError::Validation(format!(
                "invalid document id '{}': use 1-{} letters, digits, '_' or '-'",
                raw, MAX_ID_LEN
            )));
        }
        Ok(Self(raw.to_string()))
    }

    /// Parse an optional id, falling back to the default document.
    pub fn or_default(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(raw) => Self::parse(raw),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self(DEFAULT_DOCUMENT.to_string())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredDocument {
    pub document: DocumentId,
    pub html_path: PathBuf,
    pub xml_path: PathBuf,
    /// Number of leaf values found in the data file.
    pub values: usize,
}

/// A loaded template and its data.
#[derive(Debug, Clone)]
pub struct Document {
    pub html: String,
    pub data: DataMapping,
}

/// Directory of uploaded document pairs.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn template_path(&self, id: &DocumentId) -> PathBuf {
        self.root.join(id.as_str()).join(TEMPLATE_FILE)
    }

    pub fn data_path(&self, id: &DocumentId) -> PathBuf {
        self.root.join(id.as_str()).join(DATA_FILE)
    }

    /// Store a template and data file, replacing any previous pair.
    pub fn save(&self, id: &DocumentId, html: &[u8], xml: &[u8]) -> Result<StoredDocument> {
        std::str::from_utf8(html).map_err(|e| {
            DocfillError::Validation(format!("HTML template is not valid UTF-8: {}", e))
        })?;
        let xml_text = std::str::from_utf8(xml)
            .map_err(|e| DocfillError::Parse(format!("XML file is not valid UTF-8: {}", e)))?;
        let data = parse_xml(xml_text)?;

        let html_path = self.template_path(id);
        let xml_path = self.data_path(id);
        atomic_write(&xml_path, xml)?;
        atomic_write(&html_path, html)?;

        info!(
            document = %id,
            html_bytes = html.len(),
            xml_bytes = xml.len(),
            values = data.len(),
            "document uploaded"
        );

        Ok(StoredDocument {
            document: id.clone(),
            html_path,
            xml_path,
            values: data.len(),
        })
    }

    /// Load the template and data of an uploaded document.
    pub fn load(&self, id: &DocumentId) -> Result<Document> {
        let html_path = self.template_path(id);
        let xml_path = self.data_path(id);
        if !html_path.is_file() || !xml_path.is_file() {
            return Err(DocfillError::Validation(not_uploaded(id)));
        }
        let html = std::fs::read_to_string(&html_path).map_err(|e| {
            DocfillError::Storage(format!(
                "failed to read '{}': {}",
                html_path.display(),
                e
            ))
        })?;
        let data = load_xml_file(&xml_path)?;
        Ok(Document { html, data })
    }

    /// Load only the data mapping of an uploaded document.
    pub fn load_data(&self, id: &DocumentId) -> Result<DataMapping> {
        let xml_path = self.data_path(id);
        if !xml_path.is_file() {
            return Err(DocfillError::Validation(format!(
                "XML file not uploaded for document '{}'",
                id
            )));
        }
        load_xml_file(&xml_path)
    }
}

fn not_uploaded(id: &DocumentId) -> String {
    if id.as_str() == DEFAULT_DOCUMENT {
        "Uploaded files not found. Use /upload first.".to_string()
    } else {
        format!(
            "Uploaded files not found for document '{}'. Use /upload first.",
            id
        )
    }
}
