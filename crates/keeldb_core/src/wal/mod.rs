//! Write-ahead log.
//!
//! Every mutation is appended to the WAL and synced to stable storage
//! before the in-memory table changes. On restart the log is replayed on
//! top of the last snapshot to rebuild state.
//!
//! ## Frame Format
//!
//! ```text
//! | payload_len (4) | op (1) | key_len (4) | value_len (4) | key | value |
//! ```
//!
//! All integers big-endian. See [`crate::record`] for the codec.
//!
//! ## Recovery Policy
//!
//! Replay distinguishes three conditions:
//!
//! - **Clean end**: the log ends exactly at a frame boundary. Replay
//!   succeeds.
//! - **Truncated tail**: the log ends inside a frame's length prefix or
//!   payload. Under the default strict policy this is fatal; with
//!   `Config::tolerant_tail` the partial frame is discarded and replay
//!   stops at the last complete frame.
//! - **Malformed frame**: an unknown op byte, an impossible payload
//!   length, or inner lengths that do not account for the payload. Always
//!   fatal - a partial write can only shorten a frame, never rewrite it,
//!   so these indicate real corruption.
//!
//! ## Invariants
//!
//! - The WAL is append-only; frames are never modified after write
//! - The WAL is synced before a mutation is acknowledged
//! - Replay is idempotent: applying the log twice yields the same table

mod iterator;
mod writer;

pub use iterator::FrameIter;
pub use writer::WalWriter;
