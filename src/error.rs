//! Error types for fsqueue
//!
//! Provides a unified error type for all queue operations.

use thiserror::Error;

use crate::lock::LockMode;

/// Result type alias using QueueError
pub type Result<T> = std::result::Result<T, QueueError>;

/// Unified error type for fsqueue operations
#[derive(Debug, Error)]
pub enum QueueError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Locking Errors
    // -------------------------------------------------------------------------
    #[error("Failed to acquire {mode} lock: {source}")]
    LockAcquisition {
        mode: LockMode,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Corruption Errors
    // -------------------------------------------------------------------------
    #[error(
        "Index corrupt: checksum {checksum:#010x} does not match start={start} end={end} len={len}"
    )]
    IndexCorrupt {
        start: u32,
        end: u32,
        len: u32,
        checksum: u32,
    },

    #[error("Zero-length record at offset {offset}")]
    ZeroLengthRecord { offset: u64 },

    #[error("Queue file corrupt: {0}")]
    Corrupt(String),

    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    #[error("Cannot enqueue an empty payload")]
    EmptyPayload,

    #[error("Payload too large: {len} bytes does not fit a 32-bit length prefix")]
    PayloadTooLarge { len: usize },

    #[error("Queue file full: appending would overflow the 32-bit end offset")]
    QueueFull,

    #[error("Queue has been deleted")]
    Deleted,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl QueueError {
    /// True for errors that mean the file can no longer be trusted.
    ///
    /// None of these are repaired automatically; the file has to be rebuilt
    /// or discarded by whoever owns it.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            QueueError::IndexCorrupt { .. }
                | QueueError::ZeroLengthRecord { .. }
                | QueueError::Corrupt(_)
        )
    }
}
