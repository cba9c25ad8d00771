//! WAL writer.

use crate::error::EngineResult;
use crate::record::Record;
use crate::wal::FrameIter;
use keeldb_storage::StorageBackend;

/// Appends framed records to the log.
///
/// The writer is single-owner; the engine's exclusive lock serializes all
/// mutations before they reach it.
pub struct WalWriter {
    backend: Box<dyn StorageBackend>,
    sync_on_write: bool,
}

impl WalWriter {
    /// Creates a writer over the given backend.
    pub fn new(backend: Box<dyn StorageBackend>, sync_on_write: bool) -> Self {
        Self {
            backend,
            sync_on_write,
        }
    }

    /// Appends a record, forces it to stable storage, and returns the new
    /// log size.
    ///
    /// When this returns `Ok`, the frame and the file length needed to
    /// observe it are durable (unless `sync_on_write` was disabled). The
    /// returned size is what the engine compares against its snapshot
    /// threshold.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding, the append, or the sync fails. On
    /// error nothing may be assumed about the tail of the log; the caller
    /// must not apply the mutation to memory.
    pub fn append(&mut self, record: &Record) -> EngineResult<u64> {
        let frame = record.encode_frame()?;
        let size = self.backend.append(&frame)?;
        if self.sync_on_write {
            self.backend.sync()?;
        }
        Ok(size)
    }

    /// Returns the current log size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.backend.size()
    }

    /// Forces all appended frames to stable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    pub fn sync(&mut self) -> EngineResult<()> {
        self.backend.sync()?;
        Ok(())
    }

    /// Discards the entire log, durably.
    ///
    /// Called after a snapshot has been published: every frame in the log
    /// is now covered by the snapshot image.
    ///
    /// # Errors
    ///
    /// Returns an error if the truncation fails.
    pub fn reset(&mut self) -> EngineResult<()> {
        self.backend.reset()?;
        Ok(())
    }

    /// Returns a streaming iterator over the log's frames.
    pub fn iter(&self, tolerant_tail: bool) -> FrameIter<'_> {
        FrameIter::new(self.backend.as_ref(), tolerant_tail)
    }

    /// Reads every record in the log.
    ///
    /// For large logs prefer [`WalWriter::iter`]; this is a convenience
    /// for small logs and tests.
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as the iterator.
    pub fn read_all(&self, tolerant_tail: bool) -> EngineResult<Vec<(u64, Record)>> {
        self.iter(tolerant_tail).collect()
    }
}

impl std::fmt::Debug for WalWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalWriter")
            .field("sync_on_write", &self.sync_on_write)
            .finish_non_exhaustive()
    }
}
