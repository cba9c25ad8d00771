//! # KeelDB Core
//!
//! The KeelDB storage engine: a single-node, embeddable key/value store
//! with durable writes, crash recovery, and prefix scans.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌───────────────────────────────┐
//!                 │            Engine             │
//!                 │   (one RwLock per instance)   │
//!                 └──────┬────────────────┬───────┘
//!                        │                │
//!              exclusive │                │ shared
//!                        ▼                ▼
//!                 ┌─────────────┐  ┌─────────────┐
//!                 │     WAL     │  │  MemTable   │
//!                 │ append+sync │  │ deep copies │
//!                 └──────┬──────┘  └──────┬──────┘
//!                        │ size > limit   │
//!                        ▼                ▼
//!                 ┌───────────────────────────────┐
//!                 │   Snapshot (temp → rename)    │
//!                 └───────────────────────────────┘
//! ```
//!
//! A mutation is framed, appended to the WAL, and synced before the
//! in-memory table changes; if the WAL then exceeds its size limit the
//! whole table is published as a new snapshot and the WAL is reset. On
//! open, the snapshot is loaded and the WAL replayed on top of it.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod record;
pub mod snapshot;
pub mod table;
pub mod wal;

pub use config::{Config, DEFAULT_WAL_SIZE_LIMIT};
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use record::{Op, Record};
pub use table::MemTable;

/// Current version of KeelDB core.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
