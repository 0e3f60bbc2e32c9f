//! Driver configuration

use crate::error::{DriverError, DriverResult};
use fc_borrowck::BorrowckConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration, usually loaded from `flowck.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Analysis settings
    pub analysis: BorrowckConfig,
    /// Output settings
    pub output: OutputConfig,
}

/// How reports are printed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format
    pub format: OutputFormat,
}

/// Report format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One line per body, one indented line per error
    #[default]
    Text,
    /// Pretty-printed JSON array of reports
    Json,
}

impl Config {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Toml`] if the text is not a valid configuration.
    pub fn from_toml_str(text: &str) -> DriverResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Io`] if the file cannot be read, or
    /// [`DriverError::Toml`] if it is not a valid configuration.
    pub fn load(path: impl AsRef<Path>) -> DriverResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DriverError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
