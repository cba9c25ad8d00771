//! Verify command implementation.

use keeldb_core::record::read_snapshot_entry;
use keeldb_core::wal::FrameIter;
use keeldb_storage::{FileBackend, FileSnapshotFile, SnapshotFile};
use std::path::Path;

/// Runs the verify command: walks both files with the strict decoder and
/// reports the first corruption found.
pub fn run(snapshot_path: &Path, wal_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut failed = false;

    if snapshot_path.exists() {
        match verify_snapshot(snapshot_path) {
            Ok(entries) => println!("snapshot OK ({entries} entries)"),
            Err(e) => {
                println!("snapshot FAILED: {e}");
                failed = true;
            }
        }
    } else {
        println!("snapshot missing (empty start)");
    }

    if wal_path.exists() {
        match verify_wal(wal_path) {
            Ok(records) => println!("WAL OK ({records} records)"),
            Err(e) => {
                println!("WAL FAILED: {e}");
                failed = true;
            }
        }
    } else {
        println!("WAL missing (nothing to replay)");
    }

    if failed {
        return Err("verification failed".into());
    }
    Ok(())
}

fn verify_snapshot(path: &Path) -> Result<usize, Box<dyn std::error::Error>> {
    let snapshot_file = FileSnapshotFile::open(path)?;
    let mut reader = snapshot_file.reader()?;

    let mut entries = 0;
    while read_snapshot_entry(&mut reader)?.is_some() {
        entries += 1;
    }
    Ok(entries)
}

fn verify_wal(path: &Path) -> Result<usize, Box<dyn std::error::Error>> {
    let backend = FileBackend::open(path)?;

    let mut records = 0;
    for frame in FrameIter::new(&backend, false) {
        frame?;
        records += 1;
    }
    Ok(records)
}
