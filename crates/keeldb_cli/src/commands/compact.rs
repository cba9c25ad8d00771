//! Compact command implementation.

use keeldb_core::{Config, Engine};
use std::path::Path;
use tracing::info;

/// Runs the compact command: opens the engine, writes a snapshot, and
/// resets the WAL.
pub fn run(snapshot_path: &Path, wal_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let engine = Engine::open_with_config(snapshot_path, wal_path, Config::default())?;

    let wal_before = engine.wal_size()?;
    info!(wal_before, keys = engine.key_count(), "compacting");

    engine.compact()?;

    let snapshot_size = std::fs::metadata(snapshot_path)?.len();
    println!(
        "compacted: WAL {} -> 0 bytes, snapshot {} bytes, {} live keys",
        wal_before,
        snapshot_size,
        engine.key_count()
    );

    engine.close()?;
    Ok(())
}
