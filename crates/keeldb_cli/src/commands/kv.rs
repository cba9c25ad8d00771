//! Direct key/value access commands.

use keeldb_core::{Config, Engine};
use std::path::Path;

fn open(snapshot_path: &Path, wal_path: &Path) -> Result<Engine, Box<dyn std::error::Error>> {
    for path in [snapshot_path, wal_path] {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }
    Ok(Engine::open_with_config(
        snapshot_path,
        wal_path,
        Config::default(),
    )?)
}

/// Prints the value stored under `key`, or reports its absence.
pub fn get(
    snapshot_path: &Path,
    wal_path: &Path,
    key: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open(snapshot_path, wal_path)?;
    match engine.get(key.as_bytes())? {
        Some(value) => println!("{}", String::from_utf8_lossy(&value)),
        None => return Err(format!("key not found: {key}").into()),
    }
    engine.close()?;
    Ok(())
}

/// Stores `value` under `key`.
pub fn set(
    snapshot_path: &Path,
    wal_path: &Path,
    key: &str,
    value: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open(snapshot_path, wal_path)?;
    engine.put(key.as_bytes(), value.as_bytes())?;
    engine.close()?;
    Ok(())
}

/// Removes `key`.
pub fn del(
    snapshot_path: &Path,
    wal_path: &Path,
    key: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open(snapshot_path, wal_path)?;
    engine.delete(key.as_bytes())?;
    engine.close()?;
    Ok(())
}

/// Prints every key with the given prefix, one `key<TAB>value` per line.
pub fn scan(
    snapshot_path: &Path,
    wal_path: &Path,
    prefix: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open(snapshot_path, wal_path)?;

    let mut entries: Vec<_> = engine.scan_prefix(prefix.as_bytes())?.into_iter().collect();
    entries.sort();

    for (key, value) in entries {
        println!(
            "{}\t{}",
            String::from_utf8_lossy(&key),
            String::from_utf8_lossy(&value)
        );
    }

    engine.close()?;
    Ok(())
}
