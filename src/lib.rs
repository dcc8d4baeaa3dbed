//! # fsqueue
//!
//! A durable FIFO queue stored in a single file, shared by independent
//! processes through whole-file advisory locks:
//! - Length-prefixed records behind a 16-byte checksummed index header
//! - Shared/exclusive `flock` around every public operation
//! - Incremental read cursor with in-place compaction of dead space
//! - Poll-based blocking dequeue with timeout
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │          Producers / Consumers (many processes)              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Queue  (+ Blocking Dequeue)                  │
//! │        in-process Mutex → whole-file advisory lock           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┼─────────────┐
//!          │            │             │
//!          ▼            ▼             ▼
//!   ┌────────────┐ ┌──────────┐ ┌───────────┐
//!   │   Index    │ │  Record  │ │ Compactor │
//!   │   Codec    │ │  Codec   │ │ (shift +  │
//!   │ (offset 0) │ │ (len+data│ │ truncate) │
//!   └────────────┘ └──────────┘ └───────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use fsqueue::Queue;
//!
//! let queue = Queue::open("/tmp/jobs.q")?;
//! queue.enqueue(b"hello")?;
//! assert_eq!(queue.dequeue()?, Some(b"hello".to_vec()));
//! # Ok::<(), fsqueue::QueueError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod format;
pub mod lock;
pub mod compactor;
pub mod queue;
mod blocking;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{QueueError, Result};
pub use config::{Config, SyncStrategy};
pub use queue::{Queue, QueueStats, VerifyReport};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of fsqueue
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
