//! Schema registry errors

use thiserror::Error;

use crate::error::ErrorKind;
use crate::persistence::PersistenceError;

/// Result type for registry operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Schema registry errors
#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    #[error("Model not found: {0}")]
    NotFound(String),

    #[error("Model name already exists: {0}")]
    DuplicateName(String),

    #[error("Invalid model definition: {0}")]
    InvalidDefinition(String),

    /// The in-memory change was kept; only the flush failed
    #[error("Persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SchemaError {
    /// Returns the error category
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchemaError::NotFound(_) => ErrorKind::NotFound,
            SchemaError::DuplicateName(_) => ErrorKind::DuplicateName,
            SchemaError::InvalidDefinition(_) => ErrorKind::InvalidDefinition,
            SchemaError::Persistence(_) => ErrorKind::Persistence,
            SchemaError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn poisoned() -> Self {
        SchemaError::Internal("Lock poisoned".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(SchemaError::NotFound("m".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            SchemaError::DuplicateName("product".into()).kind(),
            ErrorKind::DuplicateName
        );
        assert_eq!(
            SchemaError::from(PersistenceError::Rejected("down".into())).kind(),
            ErrorKind::Persistence
        );
    }

    #[test]
    fn test_display_names_the_model() {
        let err = SchemaError::DuplicateName("product".into());
        assert_eq!(err.to_string(), "Model name already exists: product");
    }
}
