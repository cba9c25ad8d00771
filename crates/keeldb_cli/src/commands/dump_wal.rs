//! Dump-wal command implementation.

use keeldb_core::record::Op;
use keeldb_core::wal::FrameIter;
use keeldb_storage::FileBackend;
use std::path::Path;

/// Runs the dump-wal command, printing one line per frame.
///
/// Frames before a corruption are printed; the corruption itself is then
/// reported as the error.
pub fn run(wal_path: &Path, limit: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    if !wal_path.exists() {
        return Err(format!("no WAL at {}", wal_path.display()).into());
    }

    let backend = FileBackend::open(wal_path)?;
    let limit = limit.unwrap_or(usize::MAX);

    for (printed, frame) in FrameIter::new(&backend, false).enumerate() {
        if printed >= limit {
            break;
        }
        let (offset, record) = frame?;
        match record.op {
            Op::Put => println!(
                "{offset:>10}  PUT     {}  ({} byte value)",
                printable(&record.key),
                record.value.len()
            ),
            Op::Delete => println!("{offset:>10}  DELETE  {}", printable(&record.key)),
        }
    }

    Ok(())
}

fn printable(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}
