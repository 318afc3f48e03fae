//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for docfill.
///
/// This struct represents the contents of `docfill.yaml`. Every field has a
/// default, so an empty file is a valid config. Unknown fields in the YAML are
/// ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of `uploads/`, `rules/` and `events/`. Relative paths resolve
    /// against the working directory.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    pub server: ServerConfig,

    pub generator: GeneratorConfig,

    pub executor: ExecutorConfig,

    pub pdf: PdfConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            server: ServerConfig::default(),
            generator: GeneratorConfig::default(),
            executor: ExecutorConfig::default(),
            pdf: PdfConfig::default(),
        }
    }
}
