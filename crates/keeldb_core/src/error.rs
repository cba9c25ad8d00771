//! Error types for the KeelDB engine.

use std::io;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in KeelDB engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] keeldb_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A WAL frame is malformed, truncated mid-frame, or has an unknown
    /// op byte.
    #[error("WAL corruption: {message}")]
    CorruptWal {
        /// Description of the corruption.
        message: String,
    },

    /// A snapshot entry is malformed or truncated.
    #[error("snapshot corruption: {message}")]
    CorruptSnapshot {
        /// Description of the corruption.
        message: String,
    },

    /// Operation invoked on a closed engine (or on one that refused
    /// further mutations after a failed snapshot publish).
    #[error("engine is closed")]
    Closed,

    /// Invalid argument provided.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the argument issue.
        message: String,
    },
}

impl EngineError {
    /// Creates a WAL corruption error.
    pub fn corrupt_wal(message: impl Into<String>) -> Self {
        Self::CorruptWal {
            message: message.into(),
        }
    }

    /// Creates a snapshot corruption error.
    pub fn corrupt_snapshot(message: impl Into<String>) -> Self {
        Self::CorruptSnapshot {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
