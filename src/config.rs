//! Store configuration
//!
//! Where the file adapter keeps its documents and how it writes them.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// File-backed store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the model and record documents (default: "./data")
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Model definitions file name (default: "models.json")
    #[serde(default = "default_models_file")]
    pub models_file: String,

    /// Records file name (default: "records.json")
    #[serde(default = "default_records_file")]
    pub records_file: String,

    /// Pretty-print written documents (default: true)
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_models_file() -> String {
    "models.json".to_string()
}

fn default_records_file() -> String {
    "records.json".to_string()
}

fn default_pretty() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            models_file: default_models_file(),
            records_file: default_records_file(),
            pretty: default_pretty(),
        }
    }
}

impl StoreConfig {
    /// Read a JSON config file; missing keys take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn models_path(&self) -> PathBuf {
        self.data_dir.join(&self.models_file)
    }

    pub fn records_path(&self) -> PathBuf {
        self.data_dir.join(&self.records_file)
    }
}
