//! Persistence adapter errors

use thiserror::Error;

use crate::error::ErrorKind;

/// Result type for adapter operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Adapter load/save failures
#[derive(Debug, Clone, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The backend refused the write
    #[error("Write rejected: {0}")]
    Rejected(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PersistenceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PersistenceError::Internal(_) => ErrorKind::Internal,
            _ => ErrorKind::Persistence,
        }
    }
}
