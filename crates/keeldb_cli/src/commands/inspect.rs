//! Inspect command implementation.

use keeldb_core::record::Op;
use keeldb_core::snapshot;
use keeldb_core::table::MemTable;
use keeldb_core::wal::FrameIter;
use keeldb_storage::{FileBackend, FileSnapshotFile, StorageBackend};
use serde_json::json;
use std::path::Path;

/// Database inspection result.
#[derive(Debug, Default)]
struct InspectResult {
    snapshot_size: u64,
    wal_size: u64,
    snapshot_entry_count: usize,
    wal_record_count: usize,
    wal_put_count: usize,
    wal_delete_count: usize,
    live_key_count: usize,
}

/// Runs the inspect command.
pub fn run(
    snapshot_path: &Path,
    wal_path: &Path,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if !snapshot_path.exists() && !wal_path.exists() {
        return Err(format!(
            "no database at {} / {}",
            snapshot_path.display(),
            wal_path.display()
        )
        .into());
    }

    let mut result = InspectResult::default();
    let mut table = MemTable::new();

    if snapshot_path.exists() {
        result.snapshot_size = std::fs::metadata(snapshot_path)?.len();
        let snapshot_file = FileSnapshotFile::open(snapshot_path)?;
        result.snapshot_entry_count = snapshot::load_into(&snapshot_file, &mut table)?;
    }

    if wal_path.exists() {
        let backend = FileBackend::open(wal_path)?;
        result.wal_size = backend.size();
        for frame in FrameIter::new(&backend, false) {
            let (_, record) = frame?;
            match record.op {
                Op::Put => result.wal_put_count += 1,
                Op::Delete => result.wal_delete_count += 1,
            }
            result.wal_record_count += 1;
            table.apply(&record);
        }
    }

    result.live_key_count = table.len();

    match format {
        "json" => {
            let out = json!({
                "snapshot_path": snapshot_path.display().to_string(),
                "wal_path": wal_path.display().to_string(),
                "snapshot_size": result.snapshot_size,
                "wal_size": result.wal_size,
                "snapshot_entry_count": result.snapshot_entry_count,
                "wal_record_count": result.wal_record_count,
                "wal_put_count": result.wal_put_count,
                "wal_delete_count": result.wal_delete_count,
                "live_key_count": result.live_key_count,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        _ => {
            println!("Snapshot:  {}", snapshot_path.display());
            println!("WAL:       {}", wal_path.display());
            println!();
            println!("Snapshot size:     {} bytes", result.snapshot_size);
            println!("Snapshot entries:  {}", result.snapshot_entry_count);
            println!("WAL size:          {} bytes", result.wal_size);
            println!(
                "WAL records:       {} ({} puts, {} deletes)",
                result.wal_record_count, result.wal_put_count, result.wal_delete_count
            );
            println!("Live keys:         {}", result.live_key_count);
        }
    }

    Ok(())
}
