//! Record store errors

use thiserror::Error;

use crate::error::ErrorKind;
use crate::persistence::PersistenceError;

/// Result type for record store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Record store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Model {0} not found")]
    ModelNotFound(String),

    #[error("Record {record_id} not found in model {model_id}")]
    RecordNotFound { model_id: String, record_id: String },

    /// One message per failing field; `fields[i]` produced `errors[i]`
    #[error("Validation failed: {}", .errors.join(", "))]
    ValidationFailed {
        fields: Vec<String>,
        errors: Vec<String>,
    },

    #[error("Record {record_id} no longer conforms to its model: {}", .errors.join(", "))]
    StaleRecord {
        record_id: String,
        errors: Vec<String>,
    },

    /// The in-memory change was kept; only the flush failed
    #[error("Persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::ModelNotFound(_) | StoreError::RecordNotFound { .. } => ErrorKind::NotFound,
            StoreError::ValidationFailed { .. } => ErrorKind::ValidationFailed,
            StoreError::StaleRecord { .. } => ErrorKind::StaleRecord,
            StoreError::Persistence(_) => ErrorKind::Persistence,
            StoreError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Per-field messages for validation and stale-record failures
    pub fn messages(&self) -> &[String] {
        match self {
            StoreError::ValidationFailed { errors, .. } | StoreError::StaleRecord { errors, .. } => errors,
            _ => &[],
        }
    }

    /// Names of the fields that failed validation
    pub fn failed_fields(&self) -> &[String] {
        match self {
            StoreError::ValidationFailed { fields, .. } => fields,
            _ => &[],
        }
    }

    pub(crate) fn poisoned() -> Self {
        StoreError::Internal("Lock poisoned".into())
    }
}
