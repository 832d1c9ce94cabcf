//! Error kind taxonomy shared by every subsystem
//!
//! Each subsystem owns its own error enum (`SchemaError`, `StoreError`,
//! `PersistenceError`, `ConfigError`). They all map onto one `ErrorKind`
//! so callers can branch on the category without matching every variant.

use std::fmt;

/// Category of a failure reported by any modeldb operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown model or record id
    NotFound,
    /// Model name collision
    DuplicateName,
    /// One or more field values failed validation
    ValidationFailed,
    /// A model or field definition breaks its own invariants
    InvalidDefinition,
    /// Adapter load/save failed
    Persistence,
    /// A stored record no longer satisfies its model's current fields
    StaleRecord,
    /// Lock poisoned or other internal fault
    Internal,
}

impl ErrorKind {
    /// Returns the stable string code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::DuplicateName => "DUPLICATE_NAME",
            ErrorKind::ValidationFailed => "VALIDATION_FAILED",
            ErrorKind::InvalidDefinition => "INVALID_DEFINITION",
            ErrorKind::Persistence => "PERSISTENCE_FAILED",
            ErrorKind::StaleRecord => "STALE_RECORD",
            ErrorKind::Internal => "INTERNAL",
        }
    }

    /// Whether the caller can recover by correcting its input
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::NotFound
                | ErrorKind::DuplicateName
                | ErrorKind::ValidationFailed
                | ErrorKind::InvalidDefinition
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
