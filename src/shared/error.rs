//! Shared Error Types
//!
//! This module defines error types that are shared between the local store,
//! the sync engine and the UI-facing API.
//!
//! # Error Categories
//!
//! - `ValidationError` - Data validation failures (e.g. a sale with no lines)
//!
//! # Usage
//!
//! ```rust
//! use pos_offline::shared::error::SharedError;
//!
//! let error = SharedError::validation("lines", "A sale needs at least one line");
//! ```
//!
//! # Thread Safety
//!
//! All error types are `Send + Sync` and can be safely shared across thread boundaries.
use thiserror::Error;

/// Shared error types that can occur anywhere in the crate
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SharedError {
    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let error = SharedError::validation("quantity", "must be greater than zero");
        let SharedError::ValidationError { field, message } = error;
        assert_eq!(field, "quantity");
        assert_eq!(message, "must be greater than zero");
    }

    #[test]
    fn test_error_display() {
        let error = SharedError::validation("lines", "empty");
        let display = format!("{}", error);
        assert!(display.contains("Validation error"));
        assert!(display.contains("'lines'"));
    }
}
