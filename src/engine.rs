//! Engine wiring
//!
//! One persistence adapter shared by a schema registry and a record store.

use std::sync::Arc;
use tracing::info;

use crate::config::StoreConfig;
use crate::persistence::{FileAdapter, MemoryAdapter, PersistenceAdapter, PersistenceResult};
use crate::schema::SchemaRegistry;
use crate::store::RecordStore;

/// A registry and a store over the same adapter
#[derive(Debug, Clone)]
pub struct Engine {
    registry: Arc<SchemaRegistry>,
    store: Arc<RecordStore>,
}

impl Engine {
    /// Open the JSON documents under `config.data_dir`, loading any stored
    /// models and records
    pub fn open(config: &StoreConfig) -> PersistenceResult<Self> {
        let engine = Self::with_adapter(Arc::new(FileAdapter::from_config(config)))?;
        info!(
            data_dir = %config.data_dir.display(),
            models = engine.registry.len(),
            "engine opened"
        );
        Ok(engine)
    }

    /// Load models, then records, from `adapter`
    pub fn with_adapter(adapter: Arc<dyn PersistenceAdapter>) -> PersistenceResult<Self> {
        let registry = Arc::new(SchemaRegistry::open(adapter.clone())?);
        let store = Arc::new(RecordStore::open(registry.clone(), adapter)?);
        Ok(Self { registry, store })
    }

    /// Empty engine over a fresh in-memory adapter
    pub fn in_memory() -> Self {
        let adapter: Arc<dyn PersistenceAdapter> = Arc::new(MemoryAdapter::new());
        let registry = Arc::new(SchemaRegistry::new(adapter.clone()));
        let store = Arc::new(RecordStore::new(registry.clone(), adapter));
        Self { registry, store }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }
}
