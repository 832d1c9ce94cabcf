//! In-memory adapter for tests and ephemeral use

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use super::errors::{PersistenceError, PersistenceResult};
use super::{PersistenceAdapter, RecordSnapshot};
use crate::schema::ModelDefinition;

/// Keeps the last saved snapshots in memory.
///
/// Writes can be switched to fail, which leaves the previously saved
/// snapshot in place.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    models: RwLock<Vec<ModelDefinition>>,
    records: RwLock<RecordSnapshot>,
    fail_writes: AtomicBool,
    model_saves: AtomicUsize,
    record_saves: AtomicUsize,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent save fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful model saves
    pub fn model_saves(&self) -> usize {
        self.model_saves.load(Ordering::SeqCst)
    }

    /// Number of successful record saves
    pub fn record_saves(&self) -> usize {
        self.record_saves.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> PersistenceResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Rejected("writes disabled".into()));
        }
        Ok(())
    }
}

impl PersistenceAdapter for MemoryAdapter {
    fn load_models(&self) -> PersistenceResult<Vec<ModelDefinition>> {
        self.models
            .read()
            .map(|m| m.clone())
            .map_err(|_| PersistenceError::Internal("Lock poisoned".into()))
    }

    fn save_models(&self, models: &[ModelDefinition]) -> PersistenceResult<()> {
        self.check_writable()?;
        let mut stored = self
            .models
            .write()
            .map_err(|_| PersistenceError::Internal("Lock poisoned".into()))?;
        *stored = models.to_vec();
        self.model_saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load_records(&self) -> PersistenceResult<RecordSnapshot> {
        self.records
            .read()
            .map(|r| r.clone())
            .map_err(|_| PersistenceError::Internal("Lock poisoned".into()))
    }

    fn save_records(&self, records: &RecordSnapshot) -> PersistenceResult<()> {
        self.check_writable()?;
        let mut stored = self
            .records
            .write()
            .map_err(|_| PersistenceError::Internal("Lock poisoned".into()))?;
        *stored = records.clone();
        self.record_saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
