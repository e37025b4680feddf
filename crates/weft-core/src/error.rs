//! Error types for weft operations.
//!
//! The taxonomy follows the layer boundaries: `NotFound`, `InvalidState`,
//! and `InvalidOperation` describe recoverable game-state conditions the
//! orchestration layer turns into failure results; `Branch` covers name
//! collisions and missing branches at the world-store boundary; the
//! remaining variants are infrastructure faults that propagate as-is.

use thiserror::Error;

/// Result type alias for weft operations.
pub type WeftResult<T> = Result<T, WeftError>;

/// Main error type for all weft operations.
#[derive(Error, Debug)]
pub enum WeftError {
    /// A universe, entity, or event id did not resolve.
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Operation attempted against a record in the wrong status.
    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    /// Operation is semantically disallowed.
    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    /// Branch name collision or missing branch.
    #[error("Branch error: {message}")]
    Branch { message: String },

    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WeftError {
    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Create a branch error.
    pub fn branch(message: impl Into<String>) -> Self {
        Self::Branch {
            message: message.into(),
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            source: None,
        }
    }

    /// Whether this error represents an expected, recoverable game-state
    /// condition rather than an infrastructure fault.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::InvalidState { .. }
                | Self::InvalidOperation { .. }
                | Self::Branch { .. }
        )
    }
}

impl From<rusqlite::Error> for WeftError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
