//! Configuration for fsqueue
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

use crate::error::{QueueError, Result};

/// Main configuration for a queue handle
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Blocking Dequeue Configuration
    // -------------------------------------------------------------------------
    /// Sleep between two polling attempts of `bdequeue`
    pub poll_interval: Duration,

    // -------------------------------------------------------------------------
    // Compaction Configuration
    // -------------------------------------------------------------------------
    /// Dequeue compacts the file once the read cursor moves past this offset
    pub compaction_threshold: u64,

    /// Size of each copy step while shifting live records to the front
    pub compaction_chunk_size: usize,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: whether mutations are flushed to disk before returning
    pub sync_strategy: SyncStrategy,
}

/// Sync strategy for mutating operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncStrategy {
    /// Leave flushing to the OS page cache (fastest)
    #[default]
    Never,

    /// `fdatasync` after every enqueue/dequeue/clear (safest, slowest)
    EveryWrite,
}

/// Default compaction threshold: 50 MB of dead space before the read cursor
pub const DEFAULT_COMPACTION_THRESHOLD: u64 = 50 * 1024 * 1024;

/// Default compaction copy chunk: 128 KB
pub const DEFAULT_COMPACTION_CHUNK_SIZE: usize = 128 * 1024;

/// Default bdequeue poll interval: 100 ms
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            compaction_threshold: DEFAULT_COMPACTION_THRESHOLD,
            compaction_chunk_size: DEFAULT_COMPACTION_CHUNK_SIZE,
            sync_strategy: SyncStrategy::Never,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the queue cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.compaction_chunk_size == 0 {
            return Err(QueueError::Config(
                "compaction_chunk_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the bdequeue poll interval
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Set the bdequeue poll interval in microseconds
    pub fn poll_interval_us(mut self, micros: u64) -> Self {
        self.config.poll_interval = Duration::from_micros(micros);
        self
    }

    /// Set the compaction threshold (in bytes)
    pub fn compaction_threshold(mut self, bytes: u64) -> Self {
        self.config.compaction_threshold = bytes;
        self
    }

    /// Set the compaction copy chunk size (in bytes)
    pub fn compaction_chunk_size(mut self, bytes: usize) -> Self {
        self.config.compaction_chunk_size = bytes;
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
