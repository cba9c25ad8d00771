//! Benchmark utilities for KeelDB.

#![deny(unsafe_code)]

/// Generates deterministic data of the given size.
pub fn sized_value(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

/// Generates `count` distinct keys with a common prefix.
pub fn keys(count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| format!("bench:key:{i:08}").into_bytes())
        .collect()
}
