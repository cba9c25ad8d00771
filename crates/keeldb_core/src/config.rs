//! Engine configuration.

/// Default WAL size limit before a snapshot is taken: 10 MiB.
pub const DEFAULT_WAL_SIZE_LIMIT: u64 = 10 * 1024 * 1024;

/// Configuration for opening an engine.
#[derive(Debug, Clone)]
pub struct Config {
    /// WAL size (bytes) above which a mutation triggers a snapshot.
    pub wal_size_limit: u64,

    /// Whether to sync the WAL after every mutation (safer but slower).
    ///
    /// Turning this off voids the durability guarantee; it exists for
    /// benchmarks and tests only.
    pub sync_on_write: bool,

    /// Whether WAL replay stops at the last complete frame instead of
    /// failing when the log ends mid-frame.
    ///
    /// The default is the strict policy: a truncated tail refuses to open.
    /// Either way, a malformed frame body or unknown op byte is always
    /// fatal.
    pub tolerant_tail: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wal_size_limit: DEFAULT_WAL_SIZE_LIMIT,
            sync_on_write: true,
            tolerant_tail: false,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the WAL size limit.
    #[must_use]
    pub const fn wal_size_limit(mut self, limit: u64) -> Self {
        self.wal_size_limit = limit;
        self
    }

    /// Sets whether to sync the WAL after every mutation.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }

    /// Sets whether WAL replay tolerates a truncated tail.
    #[must_use]
    pub const fn tolerant_tail(mut self, value: bool) -> Self {
        self.tolerant_tail = value;
        self
    }
}
