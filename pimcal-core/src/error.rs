//! Error types for pimcal.

use thiserror::Error;

/// Errors that can occur while resolving or editing notes and their occurrences.
#[derive(Error, Debug)]
pub enum PimError {
    /// The operation is not legal on this kind of item, e.g. a master-only
    /// operation invoked on an occurrence view.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Type mismatch: cannot compare a {found} value with a {expected} value")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Stamp '{0}' is not registered")]
    UnknownStamp(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Recurrence error: {0}")]
    Recurrence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PimError {
    pub(crate) fn only_master(operation: &str) -> Self {
        PimError::InvalidOperation(format!(
            "{operation}: only the master item supports this"
        ))
    }
}

/// Result type alias for pimcal operations.
pub type PimResult<T> = Result<T, PimError>;
