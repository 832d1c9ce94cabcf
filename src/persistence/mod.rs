//! Persistence adapters
//!
//! The registry and the store survive restarts through a replaceable
//! adapter with two load/save pairs. Each save receives the complete
//! current snapshot; adapters must make every save atomic so a restart
//! never observes a partial write.

mod errors;
mod file;
mod memory;

use std::collections::BTreeMap;
use std::fmt;

pub use errors::{PersistenceError, PersistenceResult};
pub use file::FileAdapter;
pub use memory::MemoryAdapter;

use crate::schema::ModelDefinition;
use crate::store::ModelRecord;

/// Every record, grouped by owning model id
pub type RecordSnapshot = BTreeMap<String, Vec<ModelRecord>>;

/// Storage backend for model definitions and records
pub trait PersistenceAdapter: Send + Sync + fmt::Debug {
    /// Load all model definitions in insertion order; empty if none stored
    fn load_models(&self) -> PersistenceResult<Vec<ModelDefinition>>;

    /// Replace the stored model definitions
    fn save_models(&self, models: &[ModelDefinition]) -> PersistenceResult<()>;

    /// Load every record; empty if none stored
    fn load_records(&self) -> PersistenceResult<RecordSnapshot>;

    /// Replace the stored records
    fn save_records(&self, records: &RecordSnapshot) -> PersistenceResult<()>;
}
