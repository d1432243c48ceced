use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Markdown,
    #[serde(alias = "plain")]
    PlainText,
}

/// Rendering options. Every field has a default, so a JSON options file only
/// needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    pub format: ReportFormat,
    pub max_differences_to_show: usize,
    pub include_inferences: bool,
    #[serde(alias = "include_raw_log_excerpts")]
    pub include_evidence: bool,
    pub max_evidence_lines: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            format: ReportFormat::Markdown,
            max_differences_to_show: usize::MAX,
            include_inferences: true,
            include_evidence: true,
            max_evidence_lines: 10,
        }
    }
}

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("failed to read options file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid options file {path}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ReportOptions {
    /// Loads options from a JSON file.
    pub fn load(path: &Path) -> Result<Self, OptionsError> {
        let content = std::fs::read_to_string(path).map_err(|source| OptionsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let options = serde_json::from_str(&content).map_err(|source| OptionsError::Json {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("loaded report options from {}", path.display());
        Ok(options)
    }

    pub fn save(&self, path: &Path) -> Result<(), OptionsError> {
        let io_err = |source| OptionsError::Io {
            path: path.display().to_string(),
            source,
        };
        let content = serde_json::to_string_pretty(self).map_err(|source| OptionsError::Json {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::write(path, content).map_err(io_err)
    }
}
