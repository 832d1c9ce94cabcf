//! Schema subsystem
//!
//! Model definitions, the field type taxonomy, tagged values, the validation
//! engine, and the registry that owns every model definition.
//!
//! # Design Principles
//!
//! - Validation is pure and shared by every writer
//! - Model ids are assigned once and never change
//! - Model names are unique across the registry
//! - Deleting a model never touches its records

mod errors;
mod registry;
mod types;
mod validator;
mod value;

pub use errors::{SchemaError, SchemaResult};
pub use registry::SchemaRegistry;
pub use types::{
    is_identifier, FieldDefinition, FieldPatch, FieldType, ModelDefinition, ModelPatch,
    ModelSpec, RelationKind,
};
pub use validator::{validate_field, RecordValidator, ValidationResult};
pub use value::{
    data_from_json, data_to_json, FieldValue, RecordData, RelationRef, Timestamp,
};
