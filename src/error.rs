//! Error types for the record model

use thiserror::Error;

use crate::value::SchemaType;

/// Result type for schema and record operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Record model errors
///
/// Every variant signals a programming-contract violation at the offending
/// call site. Nothing here is transient or retryable; callers decide whether
/// to surface, log, or abort.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("invalid builder configuration: {reason}")]
    Configuration { reason: String },

    #[error("entry '{name}' already exists in schema")]
    DuplicateEntry { name: String },

    #[error("'{name}' not in schema")]
    UnknownEntry { name: String },

    #[error("entry '{name}' is not nullable")]
    NullabilityViolation { name: String },

    #[error("entry '{name}' expects {expected:?}, got {actual:?}")]
    TypeMismatch {
        name: String,
        expected: SchemaType,
        actual: SchemaType,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SchemaError {
    /// Shorthand for configuration errors built from format strings.
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        SchemaError::Configuration {
            reason: reason.into(),
        }
    }
}
