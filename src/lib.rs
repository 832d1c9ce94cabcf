//! modeldb - A runtime schema registry with a validated record store
//!
//! Models are defined at runtime as named, typed fields with constraints.
//! Records are created, updated, deleted and queried against those models,
//! and every write is validated against the model's current fields.

pub mod config;
pub mod engine;
pub mod error;
pub mod persistence;
pub mod schema;
pub mod store;

pub use config::{ConfigError, ConfigResult, StoreConfig};
pub use engine::Engine;
pub use error::ErrorKind;
pub use persistence::{FileAdapter, MemoryAdapter, PersistenceAdapter, PersistenceError};
pub use schema::{
    FieldDefinition, FieldType, FieldValue, ModelDefinition, ModelSpec, RecordData,
    SchemaError, SchemaRegistry,
};
pub use store::{ModelRecord, QueryOptions, QueryResult, RecordStore, SortOrder, StoreError};
