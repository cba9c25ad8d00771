//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying file operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A read was requested for bytes the store does not hold. The WAL
    /// decoder treats the log end itself as data, so this only fires on a
    /// caller bug (an offset past what `size` reported).
    #[error("read of {len} bytes at offset {offset} runs past the end of the store ({size} bytes)")]
    OutOfBounds {
        /// The requested read offset.
        offset: u64,
        /// The requested read length.
        len: usize,
        /// The store size at the time of the read.
        size: u64,
    },
}
