//! Engine façade and recovery.

use crate::config::Config;
use crate::error::{EngineError, EngineResult};
use crate::record::Record;
use crate::snapshot;
use crate::table::MemTable;
use crate::wal::WalWriter;
use keeldb_storage::{
    FileBackend, FileSnapshotFile, InMemoryBackend, MemorySnapshotFile, SnapshotFile,
    StorageBackend,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;

/// The durable key/value engine.
///
/// An `Engine` owns an in-memory table, a write-ahead log, and a snapshot
/// image. Every mutation is framed, appended to the WAL, and synced before
/// the table changes; when the WAL outgrows its limit the whole table is
/// written to a fresh snapshot and the WAL is reset.
///
/// # Opening an Engine
///
/// ```rust,ignore
/// use keeldb_core::Engine;
/// use std::path::Path;
///
/// let engine = Engine::open(
///     Path::new("db/database.db"),
///     Path::new("db/wal.log"),
///     10 * 1024 * 1024,
/// )?;
///
/// engine.put(b"user:1", b"alice")?;
/// assert_eq!(engine.get(b"user:1")?, Some(b"alice".to_vec()));
///
/// engine.close()?;
/// ```
///
/// # Concurrency
///
/// One reader-writer lock per engine: `get` and `scan_prefix` take it
/// shared, `put`, `delete`, `compact`, and `close` take it exclusive.
/// Mutations are totally ordered by exclusive-lock acquisition, and a
/// reader that starts after a writer releases sees that writer's effect.
///
/// # Ephemeral Engines
///
/// For tests, [`Engine::open_in_memory`] builds an engine over in-memory
/// stores; the full WAL and snapshot machinery runs without touching disk.
pub struct Engine {
    config: Config,
    state: RwLock<EngineState>,
}

struct EngineState {
    table: MemTable,
    wal: WalWriter,
    snapshot: Box<dyn SnapshotFile>,
    status: Status,
}

/// Lifecycle of an engine instance. There is no way back to `Open`;
/// re-opening constructs a fresh instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    /// Serving reads and writes.
    Open,
    /// A snapshot publish failed after its commit point; the image on disk
    /// is valid but this instance's handles are stale. Reads still work,
    /// mutations are refused.
    Poisoned,
    /// Closed by the caller. Everything is refused.
    Closed,
}

impl EngineState {
    fn ensure_readable(&self) -> EngineResult<()> {
        match self.status {
            Status::Open | Status::Poisoned => Ok(()),
            Status::Closed => Err(EngineError::Closed),
        }
    }

    fn ensure_mutable(&self) -> EngineResult<()> {
        match self.status {
            Status::Open => Ok(()),
            Status::Poisoned | Status::Closed => Err(EngineError::Closed),
        }
    }
}

impl Engine {
    /// Opens an engine over the given snapshot and WAL paths.
    ///
    /// Both files are created if absent. Recovery runs before this
    /// returns: the snapshot is loaded, then the WAL is replayed on top
    /// of it (WAL records win for keys they touch).
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be opened, the snapshot is
    /// corrupt, or the WAL is corrupt. No engine is returned on error;
    /// the caller decides whether to rebuild.
    pub fn open(snapshot_path: &Path, wal_path: &Path, wal_size_limit: u64) -> EngineResult<Self> {
        Self::open_with_config(
            snapshot_path,
            wal_path,
            Config::default().wal_size_limit(wal_size_limit),
        )
    }

    /// Opens an engine with full configuration control.
    ///
    /// # Errors
    ///
    /// As [`Engine::open`].
    pub fn open_with_config(
        snapshot_path: &Path,
        wal_path: &Path,
        config: Config,
    ) -> EngineResult<Self> {
        let wal_backend = FileBackend::open(wal_path)?;
        let snapshot_file = FileSnapshotFile::open(snapshot_path)?;
        Self::open_with_stores(config, Box::new(wal_backend), Box::new(snapshot_file))
    }

    /// Opens an engine over pre-built stores.
    ///
    /// This is the lower-level constructor behind the path-based opens; it
    /// also lets tests replay captured bytes through recovery.
    ///
    /// # Errors
    ///
    /// Returns an error if recovery fails.
    pub fn open_with_stores(
        config: Config,
        wal_backend: Box<dyn StorageBackend>,
        snapshot_file: Box<dyn SnapshotFile>,
    ) -> EngineResult<Self> {
        let mut table = MemTable::new();
        snapshot::load_into(snapshot_file.as_ref(), &mut table)?;

        let wal = WalWriter::new(wal_backend, config.sync_on_write);
        for frame in wal.iter(config.tolerant_tail) {
            let (_, record) = frame?;
            table.apply(&record);
        }

        Ok(Self {
            config,
            state: RwLock::new(EngineState {
                table,
                wal,
                snapshot: snapshot_file,
                status: Status::Open,
            }),
        })
    }

    /// Opens a fresh engine backed entirely by memory.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the signature matches the other opens.
    pub fn open_in_memory(config: Config) -> EngineResult<Self> {
        Self::open_with_stores(
            config,
            Box::new(InMemoryBackend::new()),
            Box::new(MemorySnapshotFile::new()),
        )
    }

    /// Looks up a key, returning a copy of its value.
    ///
    /// # Errors
    ///
    /// Returns `Closed` if the engine has been closed.
    pub fn get(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        let state = self.state.read();
        state.ensure_readable()?;
        Ok(state.table.lookup(key))
    }

    /// Inserts or overwrites a key.
    ///
    /// When this returns `Ok`, the mutation is on stable storage: the
    /// frame is in the WAL and the WAL has been synced. The engine copies
    /// both buffers; the caller is free to reuse or mutate them.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty key or an over-long
    /// key/value, `Closed` after close, or the underlying I/O error. On
    /// an I/O error the table is untouched - "in memory but not in the
    /// WAL" can never be observed.
    pub fn put(&self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        check_key(key)?;
        self.mutate(Record::put(key, value))
    }

    /// Removes a key. Deleting an absent key is a no-op that still
    /// succeeds (and still writes a WAL record).
    ///
    /// # Errors
    ///
    /// As [`Engine::put`].
    pub fn delete(&self, key: &[u8]) -> EngineResult<()> {
        check_key(key)?;
        self.mutate(Record::delete(key))
    }

    /// Returns copies of every entry whose key starts with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns `Closed` if the engine has been closed.
    pub fn scan_prefix(&self, prefix: &[u8]) -> EngineResult<HashMap<Vec<u8>, Vec<u8>>> {
        let state = self.state.read();
        state.ensure_readable()?;
        Ok(state.table.scan_prefix(prefix))
    }

    /// Writes a snapshot now, regardless of WAL size.
    ///
    /// On success the snapshot image holds every live key and the WAL is
    /// empty. Failure before the image is renamed into place leaves the
    /// engine fully usable; failure after it leaves the instance refusing
    /// further mutations (the next open recovers from the published
    /// image).
    ///
    /// # Errors
    ///
    /// Returns `Closed` on a closed or poisoned engine, or the underlying
    /// error.
    pub fn compact(&self) -> EngineResult<()> {
        let mut state = self.state.write();
        state.ensure_mutable()?;
        Self::write_snapshot(&mut state)
    }

    /// Flushes both files and closes the engine.
    ///
    /// Close is idempotent; every other operation on a closed engine
    /// returns `Closed`.
    ///
    /// # Errors
    ///
    /// Returns an error if a final sync fails; the engine stays open so
    /// the caller can retry.
    pub fn close(&self) -> EngineResult<()> {
        let mut state = self.state.write();
        if state.status == Status::Closed {
            return Ok(());
        }

        state.wal.sync()?;
        state.snapshot.sync()?;
        state.status = Status::Closed;
        Ok(())
    }

    /// Returns true until [`Engine::close`] succeeds.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.read().status != Status::Closed
    }

    /// Returns the current WAL size in bytes.
    ///
    /// # Errors
    ///
    /// Returns `Closed` after close.
    pub fn wal_size(&self) -> EngineResult<u64> {
        let state = self.state.read();
        state.ensure_readable()?;
        Ok(state.wal.size())
    }

    /// Returns the number of live keys.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.state.read().table.len()
    }

    /// Runs one committed mutation: WAL append + sync, then memory, then
    /// the compaction check.
    fn mutate(&self, record: Record) -> EngineResult<()> {
        let mut state = self.state.write();
        state.ensure_mutable()?;

        let wal_size = state.wal.append(&record)?;
        state.table.apply(&record);

        if wal_size > self.config.wal_size_limit {
            Self::write_snapshot(&mut state)?;
        }
        Ok(())
    }

    fn write_snapshot(state: &mut EngineState) -> EngineResult<()> {
        let image = snapshot::encode_table(&state.table)?;
        state.snapshot.publish(&image)?;

        // The rename has committed. If the handle swap or the WAL reset
        // fails now, disk and this instance disagree; refuse mutations and
        // let the next open recover from the published image.
        let result = state
            .snapshot
            .reopen()
            .map_err(EngineError::from)
            .and_then(|()| state.wal.reset());

        if let Err(e) = result {
            state.status = Status::Poisoned;
            return Err(e);
        }
        Ok(())
    }
}

fn check_key(key: &[u8]) -> EngineResult<()> {
    if key.is_empty() {
        return Err(EngineError::invalid_argument("key must not be empty"));
    }
    Ok(())
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("Engine")
            .field("status", &state.status)
            .field("key_count", &state.table.len())
            .finish_non_exhaustive()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_engine() -> Engine {
        Engine::open_in_memory(Config::default()).unwrap()
    }

    #[test]
    fn set_then_get() {
        let engine = create_engine();
        engine.put(b"key1", b"value1").unwrap();

        assert_eq!(engine.get(b"key1").unwrap(), Some(b"value1".to_vec()));
        assert_eq!(engine.get(b"absent").unwrap(), None);
    }

    #[test]
    fn delete_removes_key() {
        let engine = create_engine();
        engine.put(b"k", b"v").unwrap();
        engine.delete(b"k").unwrap();

        assert_eq!(engine.get(b"k").unwrap(), None);
    }

    #[test]
    fn delete_absent_key_succeeds() {
        let engine = create_engine();
        engine.delete(b"never existed").unwrap();
        assert_eq!(engine.key_count(), 0);
    }

    #[test]
    fn overwrite_keeps_last_value() {
        let engine = create_engine();
        engine.put(b"key", b"v1").unwrap();
        engine.put(b"key", b"v2").unwrap();

        assert_eq!(engine.get(b"key").unwrap(), Some(b"v2".to_vec()));
        assert_eq!(engine.key_count(), 1);
    }

    #[test]
    fn empty_value_roundtrips() {
        let engine = create_engine();
        engine.put(b"k", b"").unwrap();
        assert_eq!(engine.get(b"k").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn empty_key_is_rejected() {
        let engine = create_engine();
        assert!(matches!(
            engine.put(b"", b"v"),
            Err(EngineError::InvalidArgument { .. })
        ));
        assert!(matches!(
            engine.delete(b""),
            Err(EngineError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn returned_buffers_are_isolated() {
        let engine = create_engine();
        engine.put(b"k", b"stable").unwrap();

        let mut out = engine.get(b"k").unwrap().unwrap();
        out[0] = b'X';

        assert_eq!(engine.get(b"k").unwrap(), Some(b"stable".to_vec()));
    }

    #[test]
    fn caller_buffers_are_copied_on_put() {
        let engine = create_engine();
        let mut value = b"before".to_vec();
        engine.put(b"k", &value).unwrap();

        value[0] = b'X';
        assert_eq!(engine.get(b"k").unwrap(), Some(b"before".to_vec()));
    }

    #[test]
    fn scan_prefix_matches_exactly() {
        let engine = create_engine();
        engine.put(b"user:1", b"a").unwrap();
        engine.put(b"user:2", b"b").unwrap();
        engine.put(b"order:1", b"c").unwrap();

        let result = engine.scan_prefix(b"user:").unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.contains_key(b"user:1".as_slice()));
        assert!(result.contains_key(b"user:2".as_slice()));
    }

    #[test]
    fn wal_grows_then_compaction_resets_it() {
        let engine =
            Engine::open_in_memory(Config::default().wal_size_limit(64)).unwrap();

        // Each put is well under the limit, so the trigger fires partway
        // through, not on the first write.
        for i in 0..10u8 {
            engine.put(format!("key{i}").as_bytes(), b"0123456789").unwrap();
        }

        // The last snapshot left the WAL under the limit again.
        assert!(engine.wal_size().unwrap() <= 64);

        for i in 0..10u8 {
            let key = format!("key{i}");
            assert_eq!(
                engine.get(key.as_bytes()).unwrap(),
                Some(b"0123456789".to_vec()),
                "{key} lost across compaction"
            );
        }
    }

    #[test]
    fn manual_compact_empties_the_wal() {
        let engine = create_engine();
        engine.put(b"a", b"1").unwrap();
        engine.put(b"b", b"2").unwrap();
        assert!(engine.wal_size().unwrap() > 0);

        engine.compact().unwrap();

        assert_eq!(engine.wal_size().unwrap(), 0);
        assert_eq!(engine.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(engine.get(b"b").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn compact_preserves_deletes() {
        let engine = create_engine();
        engine.put(b"keep", b"1").unwrap();
        engine.put(b"drop", b"2").unwrap();
        engine.delete(b"drop").unwrap();

        engine.compact().unwrap();

        assert_eq!(engine.get(b"keep").unwrap(), Some(b"1".to_vec()));
        assert_eq!(engine.get(b"drop").unwrap(), None);
        assert_eq!(engine.key_count(), 1);
    }

    #[test]
    fn close_is_idempotent_and_terminal() {
        let engine = create_engine();
        engine.put(b"k", b"v").unwrap();

        engine.close().unwrap();
        engine.close().unwrap();
        assert!(!engine.is_open());

        assert!(matches!(engine.get(b"k"), Err(EngineError::Closed)));
        assert!(matches!(engine.put(b"k", b"v"), Err(EngineError::Closed)));
        assert!(matches!(engine.delete(b"k"), Err(EngineError::Closed)));
        assert!(matches!(engine.scan_prefix(b""), Err(EngineError::Closed)));
        assert!(matches!(engine.compact(), Err(EngineError::Closed)));
    }

    #[test]
    fn recovery_replays_wal_over_snapshot() {
        // Build stores by hand: a snapshot saying a=old, b=old and a WAL
        // that overwrites a and deletes b.
        let mut table = MemTable::new();
        table.apply_put(b"a", b"old");
        table.apply_put(b"b", b"old");
        let image = snapshot::encode_table(&table).unwrap();

        let mut wal_bytes = Vec::new();
        wal_bytes.extend_from_slice(&Record::put(b"a", b"new").encode_frame().unwrap());
        wal_bytes.extend_from_slice(&Record::delete(b"b").encode_frame().unwrap());
        wal_bytes.extend_from_slice(&Record::put(b"c", b"fresh").encode_frame().unwrap());

        let engine = Engine::open_with_stores(
            Config::default(),
            Box::new(InMemoryBackend::from_bytes(wal_bytes)),
            Box::new(MemorySnapshotFile::with_image(image)),
        )
        .unwrap();

        assert_eq!(engine.get(b"a").unwrap(), Some(b"new".to_vec()));
        assert_eq!(engine.get(b"b").unwrap(), None);
        assert_eq!(engine.get(b"c").unwrap(), Some(b"fresh".to_vec()));
    }

    /// Two frames, crashed partway through the second.
    fn crashed_mid_append() -> InMemoryBackend {
        let mut wal_bytes = Record::put(b"a", b"1").encode_frame().unwrap();
        wal_bytes.extend_from_slice(&Record::put(b"b", b"2").encode_frame().unwrap());

        let mut wal = InMemoryBackend::from_bytes(wal_bytes);
        wal.chop_tail(3);
        wal
    }

    #[test]
    fn open_fails_on_truncated_wal() {
        let result = Engine::open_with_stores(
            Config::default(),
            Box::new(crashed_mid_append()),
            Box::new(MemorySnapshotFile::new()),
        );

        assert!(matches!(result, Err(EngineError::CorruptWal { .. })));
    }

    #[test]
    fn tolerant_tail_opens_on_truncated_wal() {
        let engine = Engine::open_with_stores(
            Config::default().tolerant_tail(true),
            Box::new(crashed_mid_append()),
            Box::new(MemorySnapshotFile::new()),
        )
        .unwrap();

        // The complete first frame survives; the partial second is gone.
        assert_eq!(engine.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(engine.get(b"b").unwrap(), None);
    }

    #[test]
    fn open_fails_on_corrupt_snapshot() {
        let mut table = MemTable::new();
        table.apply_put(b"key", b"value");
        let mut image = snapshot::encode_table(&table).unwrap();
        image.truncate(image.len() - 2);

        let result = Engine::open_with_stores(
            Config::default(),
            Box::new(InMemoryBackend::new()),
            Box::new(MemorySnapshotFile::with_image(image)),
        );

        assert!(matches!(result, Err(EngineError::CorruptSnapshot { .. })));
    }
}

/// Persistence tests that exercise the real file stores.
#[cfg(test)]
mod persistence_tests {
    use super::*;
    use tempfile::tempdir;

    const LIMIT: u64 = 10 * 1024 * 1024;

    #[test]
    fn state_survives_close_and_reopen() {
        let dir = tempdir().unwrap();
        let snapshot_path = dir.path().join("database.db");
        let wal_path = dir.path().join("wal.log");

        {
            let engine = Engine::open(&snapshot_path, &wal_path, LIMIT).unwrap();
            engine.put(b"a", b"1").unwrap();
            engine.put(b"b", b"2").unwrap();
            engine.close().unwrap();
        }

        {
            let engine = Engine::open(&snapshot_path, &wal_path, LIMIT).unwrap();
            assert_eq!(engine.get(b"a").unwrap(), Some(b"1".to_vec()));
            assert_eq!(engine.get(b"b").unwrap(), Some(b"2".to_vec()));
        }
    }

    #[test]
    fn state_survives_a_crash_without_close() {
        let dir = tempdir().unwrap();
        let snapshot_path = dir.path().join("database.db");
        let wal_path = dir.path().join("wal.log");

        {
            let engine = Engine::open(&snapshot_path, &wal_path, LIMIT).unwrap();
            engine.put(b"key", b"v1").unwrap();
            engine.put(b"key", b"v2").unwrap();
            engine.delete(b"other").unwrap();
            // Dropped without close: every acknowledged mutation is
            // already synced in the WAL.
            std::mem::forget(engine);
        }

        let engine = Engine::open(&snapshot_path, &wal_path, LIMIT).unwrap();
        assert_eq!(engine.get(b"key").unwrap(), Some(b"v2".to_vec()));
        assert_eq!(engine.get(b"other").unwrap(), None);
    }

    #[test]
    fn every_mutation_wins_its_last_write_after_crash() {
        let dir = tempdir().unwrap();
        let snapshot_path = dir.path().join("database.db");
        let wal_path = dir.path().join("wal.log");

        {
            let engine = Engine::open(&snapshot_path, &wal_path, LIMIT).unwrap();
            for round in 0..3u8 {
                for i in 0..20u8 {
                    let key = format!("key:{i}");
                    engine.put(key.as_bytes(), &[round, i]).unwrap();
                }
            }
            for i in (0..20u8).step_by(3) {
                engine.delete(format!("key:{i}").as_bytes()).unwrap();
            }
            std::mem::forget(engine);
        }

        let engine = Engine::open(&snapshot_path, &wal_path, LIMIT).unwrap();
        for i in 0..20u8 {
            let expected = if i % 3 == 0 { None } else { Some(vec![2, i]) };
            assert_eq!(
                engine.get(format!("key:{i}").as_bytes()).unwrap(),
                expected,
                "key:{i} after recovery"
            );
        }
    }

    #[test]
    fn compaction_truncates_wal_file_and_keeps_every_key() {
        let dir = tempdir().unwrap();
        let snapshot_path = dir.path().join("database.db");
        let wal_path = dir.path().join("wal.log");

        {
            let engine = Engine::open(&snapshot_path, &wal_path, 64).unwrap();
            for i in 0..10u8 {
                engine
                    .put(format!("key{i}").as_bytes(), b"0123456789")
                    .unwrap();
            }

            // At least one snapshot has fired, so the WAL file on disk is
            // far below ten frames' worth of bytes.
            assert!(std::fs::metadata(&wal_path).unwrap().len() <= 64);
            assert!(std::fs::metadata(&snapshot_path).unwrap().len() > 0);

            for i in 0..10u8 {
                assert_eq!(
                    engine.get(format!("key{i}").as_bytes()).unwrap(),
                    Some(b"0123456789".to_vec())
                );
            }
            engine.close().unwrap();
        }

        // Reopen recovers from snapshot + short WAL.
        let engine = Engine::open(&snapshot_path, &wal_path, 64).unwrap();
        assert_eq!(engine.key_count(), 10);
    }

    #[test]
    fn temp_snapshot_never_lingers() {
        let dir = tempdir().unwrap();
        let snapshot_path = dir.path().join("database.db");
        let wal_path = dir.path().join("wal.log");

        let engine = Engine::open(&snapshot_path, &wal_path, LIMIT).unwrap();
        engine.put(b"k", b"v").unwrap();
        engine.compact().unwrap();

        assert!(!dir.path().join("database.db.tmp").exists());
    }

    #[test]
    fn open_refuses_a_damaged_wal_file() {
        let dir = tempdir().unwrap();
        let snapshot_path = dir.path().join("database.db");
        let wal_path = dir.path().join("wal.log");

        {
            let engine = Engine::open(&snapshot_path, &wal_path, LIMIT).unwrap();
            engine.put(b"a", b"1").unwrap();
            engine.close().unwrap();
        }

        // Chop the tail off the only frame.
        let bytes = std::fs::read(&wal_path).unwrap();
        std::fs::write(&wal_path, &bytes[..bytes.len() - 1]).unwrap();

        let result = Engine::open(&snapshot_path, &wal_path, LIMIT);
        assert!(matches!(result, Err(EngineError::CorruptWal { .. })));

        // The tolerant configuration opens and simply drops the tail.
        let engine = Engine::open_with_config(
            &snapshot_path,
            &wal_path,
            Config::default().tolerant_tail(true),
        )
        .unwrap();
        assert_eq!(engine.get(b"a").unwrap(), None);
    }
}
