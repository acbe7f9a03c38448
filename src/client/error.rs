//! Client Error Types
//!
//! Typed failures for the three layers of the client:
//!
//! - `StoreError` - the local database could not be opened, read or written
//! - `RemoteError` - a request to the store server failed
//! - `SyncError` - a reconciliation pass could not run or was aborted
//!
//! Storage errors are always surfaced to the caller. Connectivity errors are
//! turned into "offline" by the connectivity monitor and never escape it.

use crate::shared::SharedError;
use thiserror::Error;

/// Result type for local store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for remote service calls
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Local store failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite failure: open, transaction abort, constraint, disk full
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored JSON column could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The database directory could not be created
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The write was refused before reaching the database
    #[error("rejected write: {0}")]
    Rejected(#[from] SharedError),

    /// A row holds a value this version cannot interpret
    #[error("corrupt row: {message}")]
    Corrupt {
        /// Human-readable error message
        message: String,
    },
}

impl StoreError {
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }
}

/// Remote service failures
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request never got a response
    #[error("network error: {0}")]
    Network(String),

    /// The request exceeded its deadline
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-success status
    #[error("server returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly a structured error
        body: String,
    },

    /// The response body did not have the expected shape
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Whether the failure means the server could not be reached at all
    pub fn is_connectivity(&self) -> bool {
        matches!(self, RemoteError::Network(_) | RemoteError::Timeout)
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RemoteError::Timeout
        } else if err.is_decode() {
            RemoteError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            RemoteError::Status {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            RemoteError::Network(err.to_string())
        }
    }
}

/// Sync pass failures
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The pass was not started because the client is offline
    #[error("client is offline")]
    Offline,
}
