//! # KeelDB Storage
//!
//! Byte-store backends for KeelDB.
//!
//! This crate provides the lowest-level storage abstraction for the engine.
//! Backends are **opaque byte stores** - they do not interpret the data they
//! hold. All framing (WAL records, snapshot entries) belongs to the engine.
//!
//! ## Design Principles
//!
//! - Backends are cut to the WAL's access pattern: positional reads into
//!   caller buffers, appends that report the new end offset, a single
//!   durability barrier, and reset-to-empty after a snapshot
//! - No knowledge of KeelDB record or snapshot formats
//! - No interior locking; the engine's lock serializes callers
//!
//! ## Available Stores
//!
//! - [`FileBackend`] - append-oriented persistent storage (the WAL)
//! - [`InMemoryBackend`] - for tests, and the crash/corruption harness
//! - [`FileSnapshotFile`] - the atomically replaced snapshot image
//! - [`MemorySnapshotFile`] - in-memory snapshot image for tests
//!
//! ## Example
//!
//! ```rust
//! use keeldb_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! assert_eq!(backend.append(b"hello world").unwrap(), 11);
//!
//! let mut buf = [0u8; 5];
//! backend.read_at(6, &mut buf).unwrap();
//! assert_eq!(&buf, b"world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;
mod snapshot_file;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
pub use snapshot_file::{FileSnapshotFile, MemorySnapshotFile, SnapshotFile};
