//! Storage Error Types
//!
//! Errors raised at the storage boundary. The tree services pass them
//! through unchanged; "not found" on a lookup is a normal `None`, not an
//! error.

use thiserror::Error;

/// Storage operation errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Delete or update addressed a record that does not exist
    #[error("Record not found: {id}")]
    RecordNotFound { id: String },

    /// A uniqueness constraint of the backend was violated
    #[error("Constraint violated: {context}")]
    ConstraintViolation { context: String },

    /// Any backend-specific failure
    #[error("Storage backend failed: {0}")]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    /// Create a record not found error
    pub fn record_not_found(id: impl Into<String>) -> Self {
        Self::RecordNotFound { id: id.into() }
    }

    /// Create a constraint violation error
    pub fn constraint_violation(context: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            context: context.into(),
        }
    }
}
