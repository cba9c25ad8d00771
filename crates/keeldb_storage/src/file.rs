//! File-based storage backend for persistent storage.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// A file-backed store.
///
/// The file is opened read-write-create and addressed purely by position:
/// reads use the OS positional-read calls against the offsets the frame
/// decoder computes, and appends write at the tracked end offset. Nothing
/// here depends on the file cursor, and nothing here takes a lock - the
/// engine's own lock serializes every caller, so mutating operations
/// simply take `&mut self`.
///
/// The end offset is read from file metadata once at open and maintained
/// in step with appends and resets from then on; the store assumes (as
/// the engine does) that no other process writes the file.
///
/// # Durability
///
/// [`StorageBackend::sync`] maps to `File::sync_all`, which covers both
/// the appended bytes and the file length needed to observe them.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    file: File,
    len: u64,
}

impl FileBackend {
    /// Opens or creates a file store at the given path.
    ///
    /// An existing file is picked up at its current length; a missing one
    /// starts empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created, or its
    /// length cannot be read.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let len = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            len,
        })
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageBackend for FileBackend {
    fn size(&self) -> u64 {
        self.len
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> StorageResult<()> {
        let end = offset.saturating_add(buf.len() as u64);
        if end > self.len {
            return Err(StorageError::OutOfBounds {
                offset,
                len: buf.len(),
                size: self.len,
            });
        }
        if buf.is_empty() {
            return Ok(());
        }

        read_exact_at(&self.file, buf, offset)?;
        Ok(())
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        if !data.is_empty() {
            write_all_at(&self.file, data, self.len)?;
            self.len += data.len() as u64;
        }
        Ok(self.len)
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.file.sync_all()?;
        Ok(())
    }

    fn reset(&mut self) -> StorageResult<()> {
        self.file.set_len(0)?;
        self.file.sync_all()?;
        self.len = 0;
        Ok(())
    }
}

#[cfg(unix)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(unix)]
fn write_all_at(file: &File, buf: &[u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.write_all_at(buf, offset)
}

// Windows has no pread/pwrite; seek_read and seek_write move the cursor,
// which is fine because nothing else uses it.
#[cfg(windows)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    let mut filled = 0;
    while filled < buf.len() {
        match file.seek_read(&mut buf[filled..], offset + filled as u64)? {
            0 => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "file shorter than its tracked length",
                ))
            }
            n => filled += n,
        }
    }
    Ok(())
}

#[cfg(windows)]
fn write_all_at(file: &File, buf: &[u8], offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    let mut written = 0;
    while written < buf.len() {
        match file.seek_write(&buf[written..], offset + written as u64)? {
            0 => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "failed to write whole buffer",
                ))
            }
            n => written += n,
        }
    }
    Ok(())
}
