//! In-memory storage backend for tests and ephemeral engines.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};

/// A store held in a plain byte vector.
///
/// No locking, no interior mutability: reads borrow the vector and
/// mutations take `&mut self`, the same discipline the engine's lock
/// imposes on the file store.
///
/// Beyond backing ephemeral engines, this is the crash and corruption
/// harness. A test captures a log with [`InMemoryBackend::bytes`], mangles
/// it with [`InMemoryBackend::chop_tail`] (a crash mid-append) or
/// [`InMemoryBackend::corrupt_byte`] (bit rot), and feeds the damaged log
/// back through recovery with [`InMemoryBackend::from_bytes`] - no disk
/// involved.
///
/// # Example
///
/// ```rust
/// use keeldb_storage::{StorageBackend, InMemoryBackend};
///
/// let mut backend = InMemoryBackend::new();
/// assert_eq!(backend.append(b"test data").unwrap(), 9);
///
/// let mut buf = [0u8; 4];
/// backend.read_at(0, &mut buf).unwrap();
/// assert_eq!(&buf, b"test");
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    bytes: Vec<u8>,
}

impl InMemoryBackend {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store over captured bytes, for replaying a (possibly
    /// mangled) log through recovery.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Borrows the raw store contents.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Drops the last `n` bytes, as a crash partway through an append
    /// would. Dropping more bytes than the store holds leaves it empty.
    pub fn chop_tail(&mut self, n: usize) {
        let keep = self.bytes.len().saturating_sub(n);
        self.bytes.truncate(keep);
    }

    /// Flips one bit of the byte at `offset`, simulating bit rot inside
    /// an otherwise complete record.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is outside the store.
    pub fn corrupt_byte(&mut self, offset: u64) {
        let offset = offset as usize;
        assert!(
            offset < self.bytes.len(),
            "corrupt_byte at {offset} outside store of {} bytes",
            self.bytes.len()
        );
        self.bytes[offset] ^= 0x01;
    }
}

impl StorageBackend for InMemoryBackend {
    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> StorageResult<()> {
        let end = offset.saturating_add(buf.len() as u64);
        if end > self.bytes.len() as u64 {
            return Err(StorageError::OutOfBounds {
                offset,
                len: buf.len(),
                size: self.bytes.len() as u64,
            });
        }

        let start = offset as usize;
        buf.copy_from_slice(&self.bytes[start..start + buf.len()]);
        Ok(())
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        self.bytes.extend_from_slice(data);
        Ok(self.bytes.len() as u64)
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn reset(&mut self) -> StorageResult<()> {
        self.bytes.clear();
        Ok(())
    }
}
