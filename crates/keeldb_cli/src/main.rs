//! KeelDB CLI
//!
//! Command-line tools for KeelDB database management.
//!
//! # Commands
//!
//! - `inspect` - Display database statistics
//! - `verify` - Verify snapshot and WAL integrity
//! - `dump-wal` - Dump WAL records for debugging
//! - `compact` - Write a snapshot now and reset the WAL
//! - `get` / `set` / `del` / `scan` - Direct key/value access

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// KeelDB command-line database tools.
#[derive(Parser)]
#[command(name = "keeldb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the snapshot file
    #[arg(global = true, long, default_value = "db/database.db")]
    snapshot: PathBuf,

    /// Path to the WAL file
    #[arg(global = true, long, default_value = "db/wal.log")]
    wal: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display database statistics
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Verify snapshot and WAL integrity
    Verify,

    /// Dump WAL records for debugging
    DumpWal {
        /// Maximum number of records to dump
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Write a snapshot now and reset the WAL
    Compact,

    /// Print the value stored under a key
    Get {
        /// The key to look up
        key: String,
    },

    /// Store a value under a key
    Set {
        /// The key to write
        key: String,
        /// The value to store
        value: String,
    },

    /// Remove a key
    Del {
        /// The key to remove
        key: String,
    },

    /// List every key with the given prefix
    Scan {
        /// The key prefix to match
        prefix: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { format } => {
            commands::inspect::run(&cli.snapshot, &cli.wal, &format)?;
        }
        Commands::Verify => {
            commands::verify::run(&cli.snapshot, &cli.wal)?;
        }
        Commands::DumpWal { limit } => {
            commands::dump_wal::run(&cli.wal, limit)?;
        }
        Commands::Compact => {
            commands::compact::run(&cli.snapshot, &cli.wal)?;
        }
        Commands::Get { key } => {
            commands::kv::get(&cli.snapshot, &cli.wal, &key)?;
        }
        Commands::Set { key, value } => {
            commands::kv::set(&cli.snapshot, &cli.wal, &key, &value)?;
        }
        Commands::Del { key } => {
            commands::kv::del(&cli.snapshot, &cli.wal, &key)?;
        }
        Commands::Scan { prefix } => {
            commands::kv::scan(&cli.snapshot, &cli.wal, &prefix)?;
        }
        Commands::Version => {
            println!("KeelDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("KeelDB Core v{}", keeldb_core::VERSION);
        }
    }

    Ok(())
}
