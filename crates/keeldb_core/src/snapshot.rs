//! Snapshot serialization and loading.
//!
//! A snapshot is the full in-memory table serialized as a flat sequence of
//! entries. It replaces - never extends - the previous image, so replaying
//! the WAL on top of it can never double-apply a mutation.

use crate::error::EngineResult;
use crate::record::{encode_snapshot_entry, read_snapshot_entry};
use crate::table::MemTable;
use keeldb_storage::SnapshotFile;

/// Serializes every entry of the table into a snapshot image.
///
/// Entry order is whatever the table iterates in; loaders do not care.
///
/// # Errors
///
/// Returns `InvalidArgument` if an entry exceeds the wire-format length
/// limits (which `Engine::put` already enforces on the way in).
pub fn encode_table(table: &MemTable) -> EngineResult<Vec<u8>> {
    let mut image = Vec::new();
    for (key, value) in table.iter() {
        encode_snapshot_entry(key, value, &mut image)?;
    }
    Ok(image)
}

/// Loads every entry from the snapshot into the table.
///
/// Returns the number of entries loaded. A never-published (empty)
/// snapshot loads zero entries.
///
/// # Errors
///
/// Returns `CorruptSnapshot` if the image ends inside an entry, or `Io` /
/// `Storage` if the image cannot be read.
pub fn load_into(snapshot: &dyn SnapshotFile, table: &mut MemTable) -> EngineResult<usize> {
    let mut reader = snapshot.reader()?;
    let mut loaded = 0;

    while let Some((key, value)) = read_snapshot_entry(&mut reader)? {
        table.apply_put(&key, &value);
        loaded += 1;
    }

    Ok(loaded)
}
