//! Configuration structures for the extraction pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::invoice::Field;
use crate::dataset::DEFAULT_COLUMNS;
use crate::error::{NfeError, Result};

/// Namespace declared by every NF-e layout since 2.00.
pub const NFE_NAMESPACE: &str = "http://www.portalfiscal.inf.br/nfe";

/// Main configuration for the nfe pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NfeConfig {
    /// Document parser configuration.
    pub extraction: ExtractionConfig,

    /// Directory scanning configuration.
    pub batch: BatchConfig,

    /// Export configuration.
    pub export: ExportConfig,
}

/// Document parser configuration. Passed by reference into every parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Namespaces tried in order before falling back to unqualified names.
    pub namespaces: Vec<String>,

    /// chrono formats tried after RFC 3339 for the issue date.
    pub date_formats: Vec<String>,

    /// Annotate CNPJ/CPF/access-key check digit mismatches.
    pub validate_check_digits: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            namespaces: vec![NFE_NAMESPACE.to_string()],
            date_formats: vec![
                "%Y-%m-%dT%H:%M:%S%z".to_string(),
                "%Y-%m-%dT%H:%M:%S".to_string(),
                "%Y-%m-%d".to_string(),
            ],
            validate_check_digits: true,
        }
    }
}

/// Directory scanning configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Candidate file extension, compared case-insensitively.
    pub extension: String,

    /// Descend into subdirectories. Off by default: flat scan.
    pub recursive: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            extension: "xml".to_string(),
            recursive: false,
        }
    }
}

/// Export configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Prefix CSV output with a UTF-8 byte order mark.
    pub csv_bom: bool,

    /// Columns shown when none are selected explicitly.
    pub default_columns: Vec<Field>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            csv_bom: true,
            default_columns: DEFAULT_COLUMNS.to_vec(),
        }
    }
}

impl NfeConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| NfeError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| NfeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
