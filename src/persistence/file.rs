//! JSON file adapter
//!
//! Models and records live in two JSON documents under one directory.
//! Writes go through a temp file:
//! 1. Write the full snapshot to `<file>.tmp`
//! 2. fsync the temp file
//! 3. Rename over the final file
//!
//! A missing or empty file loads as an empty snapshot.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::errors::{PersistenceError, PersistenceResult};
use super::{PersistenceAdapter, RecordSnapshot};
use crate::config::StoreConfig;
use crate::schema::ModelDefinition;

/// File-backed adapter
#[derive(Debug, Clone)]
pub struct FileAdapter {
    models_path: PathBuf,
    records_path: PathBuf,
    pretty: bool,
}

impl FileAdapter {
    /// Adapter over `dir` with default file names
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self::from_config(&StoreConfig::default().with_data_dir(dir.as_ref()))
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            models_path: config.models_path(),
            records_path: config.records_path(),
            pretty: config.pretty,
        }
    }

    pub fn models_path(&self) -> &Path {
        &self.models_path
    }

    pub fn records_path(&self) -> &Path {
        &self.records_path
    }

    fn read_json<T: DeserializeOwned + Default>(path: &Path) -> PersistenceResult<T> {
        if !path.exists() {
            return Ok(T::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            PersistenceError::Io(format!("failed to read {}: {}", path.display(), e))
        })?;

        if content.trim().is_empty() {
            return Ok(T::default());
        }

        serde_json::from_str(&content).map_err(|e| {
            PersistenceError::Serialization(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    fn write_atomic<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> PersistenceResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PersistenceError::Io(format!(
                    "failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
        .map_err(|e| PersistenceError::Serialization(e.to_string()))?;

        let temp_path = path.with_extension("json.tmp");
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| {
                PersistenceError::Io(format!("failed to create {}: {}", temp_path.display(), e))
            })?;

        file.write_all(content.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| {
                PersistenceError::Io(format!("failed to write {}: {}", temp_path.display(), e))
            })?;

        fs::rename(&temp_path, path).map_err(|e| {
            PersistenceError::Io(format!("failed to commit {}: {}", path.display(), e))
        })?;

        if let Some(parent) = path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        Ok(())
    }
}

impl PersistenceAdapter for FileAdapter {
    fn load_models(&self) -> PersistenceResult<Vec<ModelDefinition>> {
        Self::read_json(&self.models_path)
    }

    fn save_models(&self, models: &[ModelDefinition]) -> PersistenceResult<()> {
        self.write_atomic(&self.models_path, models)
    }

    fn load_records(&self) -> PersistenceResult<RecordSnapshot> {
        Self::read_json(&self.records_path)
    }

    fn save_records(&self, records: &RecordSnapshot) -> PersistenceResult<()> {
        self.write_atomic(&self.records_path, records)
    }
}
