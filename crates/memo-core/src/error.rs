//! Error types for Memo Relay.
//!
//! Every fallible operation in the core returns `Result<T, MemoError>`.
//! The taxonomy is deliberately small:
//!
//! - `NotFound`: the memo id is absent or was already deleted
//! - `ValidationFailed` / `InvalidTransition`: a precondition was violated
//!   before anything reached durable storage
//! - `Persistence`: the durable table failed a read or write
//!
//! Cache problems never show up here. A cache miss falls through to the
//! table and is not an error.
//!
//! # Example
//!
//! ```
//! use memo_core::{MemoError, Result};
//!
//! fn load(id: &str) -> Result<String> {
//!     Err(MemoError::not_found(id))
//! }
//!
//! assert!(load("abc").unwrap_err().is_not_found());
//! ```

use thiserror::Error;

use crate::types::MemoStatus;

/// Main error type for memo operations.
#[derive(Debug, Error)]
pub enum MemoError {
    /// The memo does not exist (never created, expired or deleted).
    #[error("memo not found: {id}")]
    NotFound {
        /// Requested memo id
        id: String,
    },

    /// Input rejected before reaching the store.
    #[error("validation failed for field '{field}': {message}")]
    ValidationFailed {
        /// Field that failed validation
        field: String,
        /// Description of the failure
        message: String,
    },

    /// Only `sent -> delivered` is a legal status change.
    #[error("invalid status transition from '{from}' to '{to}'")]
    InvalidTransition {
        /// Status the memo is expected to leave
        from: MemoStatus,
        /// Status that was requested
        to: MemoStatus,
    },

    /// The durable table failed.
    #[error("persistence failure during {operation}: {message}")]
    Persistence {
        /// Table operation that failed (insert, delete, ...)
        operation: String,
        /// Description of what went wrong
        message: String,
        /// Underlying error, if any
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl MemoError {
    /// Creates a NotFound error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a ValidationFailed error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an InvalidTransition error.
    pub fn invalid_transition(from: MemoStatus, to: MemoStatus) -> Self {
        Self::InvalidTransition { from, to }
    }

    /// Creates a Persistence error without a cause.
    pub fn persistence(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Persistence {
            operation: operation.into(),
            message: message.into(),
            cause: None,
        }
    }

    /// Creates a Persistence error wrapping the underlying cause.
    pub fn persistence_with_cause<E>(
        operation: impl Into<String>,
        message: impl Into<String>,
        cause: E,
    ) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Persistence {
            operation: operation.into(),
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// Returns true if the memo was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true for caller-side errors (bad input or illegal transition).
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::ValidationFailed { .. } | Self::InvalidTransition { .. }
        )
    }

    /// Returns true if the durable table failed.
    pub fn is_persistence_error(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }
}

/// Type alias for Results with MemoError.
pub type Result<T> = std::result::Result<T, MemoError>;
