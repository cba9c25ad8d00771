//! The atomically replaced snapshot image.
//!
//! A snapshot is published with the write-then-rename pattern:
//!
//! 1. Write the full image to `<path>.tmp` (created with truncate)
//! 2. Sync the temp file to stable storage
//! 3. Rename the temp file over the live path (atomic on one filesystem)
//! 4. Fsync the parent directory so the rename itself is durable
//!
//! The rename is the commit point: a reader either sees the previous image
//! or the new one, never a partial file. Re-establishing the live handle
//! after the rename is a separate step ([`SnapshotFile::reopen`]) so the
//! caller can distinguish failures before the commit point (old image still
//! live, nothing lost) from failures after it (image on disk is valid but
//! this handle is stale).

use crate::error::StorageResult;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Cursor, Read, Write};
use std::path::{Path, PathBuf};

/// A full database image that is only ever replaced atomically.
pub trait SnapshotFile: Send + Sync {
    /// Opens a fresh read stream over the current image.
    ///
    /// A never-published snapshot reads as an empty stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be opened for reading.
    fn reader(&self) -> StorageResult<Box<dyn Read + Send>>;

    /// Atomically replaces the image with `image`.
    ///
    /// On failure the previous image is untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the temp write, sync, or rename fails.
    fn publish(&mut self, image: &[u8]) -> StorageResult<()>;

    /// Re-establishes the live handle after a successful publish.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle cannot be reopened. The published
    /// image is still valid on disk; only this handle is stale.
    fn reopen(&mut self) -> StorageResult<()>;

    /// Forces the live image to stable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    fn sync(&mut self) -> StorageResult<()>;
}

fn temp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        // On Unix, fsync on a directory syncs its entries, making the
        // rename durable.
        let dir = File::open(parent)?;
        dir.sync_all()?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> StorageResult<()> {
    // NTFS metadata journaling covers the rename; directory fsync is not
    // available on Windows.
    Ok(())
}

/// A snapshot image stored in a single file.
#[derive(Debug)]
pub struct FileSnapshotFile {
    path: PathBuf,
    file: File,
}

impl FileSnapshotFile {
    /// Opens or creates the snapshot file at the given path.
    ///
    /// A missing file is created empty, which reads as a snapshot with no
    /// entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Returns the path to the live snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotFile for FileSnapshotFile {
    fn reader(&self) -> StorageResult<Box<dyn Read + Send>> {
        let file = File::open(&self.path)?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn publish(&mut self, image: &[u8]) -> StorageResult<()> {
        let tmp = temp_path(&self.path);

        let mut temp_file = File::create(&tmp)?;
        temp_file.write_all(image)?;
        temp_file.sync_all()?;
        drop(temp_file);

        fs::rename(&tmp, &self.path)?;
        sync_parent_dir(&self.path)?;

        Ok(())
    }

    fn reopen(&mut self) -> StorageResult<()> {
        self.file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)?;
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.file.sync_all()?;
        Ok(())
    }
}

/// A snapshot image held in memory, for tests and ephemeral engines.
///
/// `publish` swaps the whole buffer, mirroring the all-or-nothing visibility
/// of the file rename. Like the storage backends, it carries no locking;
/// the engine's lock serializes callers.
#[derive(Debug, Default)]
pub struct MemorySnapshotFile {
    image: Vec<u8>,
}

impl MemorySnapshotFile {
    /// Creates an empty in-memory snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an in-memory snapshot with a pre-existing image.
    #[must_use]
    pub fn with_image(image: Vec<u8>) -> Self {
        Self { image }
    }

    /// Borrows the current image.
    #[must_use]
    pub fn image(&self) -> &[u8] {
        &self.image
    }
}

impl SnapshotFile for MemorySnapshotFile {
    fn reader(&self) -> StorageResult<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(self.image.clone())))
    }

    fn publish(&mut self, image: &[u8]) -> StorageResult<()> {
        self.image = image.to_vec();
        Ok(())
    }

    fn reopen(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }
}
