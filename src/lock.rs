//! Lock Gate
//!
//! Whole-file advisory locking around each public queue operation.
//!
//! ## Responsibilities
//! - Shared lock for readers (`is_empty`, `count`, `items`, `stats`, `verify`)
//! - Exclusive lock for mutators (`enqueue`, `dequeue`, `clear`, `delete`)
//! - Release on every exit path via `Drop`
//!
//! Locks are cooperative: only processes that go through this gate are
//! serialized. They are never held across two public calls.

use std::fmt;
use std::fs::File;

use fs2::FileExt;

use crate::error::{QueueError, Result};

/// Lock flavour requested for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Many readers at once, blocks exclusive holders
    Shared,
    /// Single holder, blocks everyone else
    Exclusive,
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockMode::Shared => f.write_str("shared"),
            LockMode::Exclusive => f.write_str("exclusive"),
        }
    }
}

/// Scoped whole-file lock, released when dropped
///
/// Acquisition blocks until the OS grants the lock. A failing lock call is
/// surfaced as `LockAcquisition` with no retry.
#[derive(Debug)]
pub struct FileLock<'a> {
    file: &'a File,
    mode: LockMode,
}

impl<'a> FileLock<'a> {
    pub fn acquire(file: &'a File, mode: LockMode) -> Result<Self> {
        // Fully qualified: newer std versions ship inherent File lock methods.
        let res = match mode {
            LockMode::Shared => FileExt::lock_shared(file),
            LockMode::Exclusive => FileExt::lock_exclusive(file),
        };
        res.map_err(|source| QueueError::LockAcquisition { mode, source })?;

        Ok(Self { file, mode })
    }

    /// The locked file
    pub fn file(&self) -> &'a File {
        self.file
    }
}

impl Drop for FileLock<'_> {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(self.file) {
            tracing::warn!("Failed to release {} lock: {}", self.mode, e);
        }
    }
}
