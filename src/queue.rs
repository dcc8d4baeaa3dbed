//! Queue Module
//!
//! The queue handle that composes the lock gate, the index and record codecs
//! and the compactor.
//!
//! ## Responsibilities
//! - Open (touch) the queue file and own its handle
//! - enqueue / dequeue under an exclusive lock
//! - items / count / is_empty / stats / verify under a shared lock
//! - clear / delete lifecycle, with a terminal "deleted" state

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::compactor;
use crate::config::{Config, SyncStrategy};
use crate::error::{QueueError, Result};
use crate::format::record::encoded_len;
use crate::format::{read_index, read_length, read_record, write_index, write_record, IndexHeader};
use crate::lock::{FileLock, LockMode};

/// A durable FIFO queue backed by a single file
///
/// ## Concurrency Model
///
/// - **Across processes**: every public call takes a whole-file advisory
///   lock (shared for readers, exclusive for mutators) and releases it
///   before returning. Two calls in a row are not atomic as a pair.
///
/// - **Within a process**: the file handle sits behind a `Mutex`, so threads
///   sharing one `Queue` never race on the handle's file position. Threads
///   that open their own `Queue` on the same path are serialized by the file
///   lock like separate processes.
#[derive(Debug)]
pub struct Queue {
    /// Location of the queue file
    path: PathBuf,

    /// Queue configuration
    config: Config,

    /// Open handle, or the terminal state after `delete`
    state: Mutex<HandleState>,
}

#[derive(Debug)]
enum HandleState {
    Open(File),
    Deleted,
}

/// Snapshot of the queue file taken under a shared lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    /// Number of queued records
    pub len: u32,
    /// Read cursor (0 when the file holds no index)
    pub start: u64,
    /// Write cursor (0 when the file holds no index)
    pub end: u64,
    /// Size of the file on disk
    pub file_size: u64,
    /// Consumed bytes between the header and `start`
    pub dead_bytes: u64,
}

/// Outcome of a successful `verify` walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyReport {
    /// Records found between `start` and `end`
    pub records: u32,
    /// Sum of all payload lengths
    pub payload_bytes: u64,
}

impl Queue {
    /// Open or create a queue file with the default config
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Open or create a queue file
    ///
    /// The file is created empty if absent; an existing file is left as is.
    /// Its parent directory must already exist.
    pub fn open_with_config(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        config.validate()?;

        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        tracing::debug!("Opened queue at {}", path.display());

        Ok(Self {
            path,
            config,
            state: Mutex::new(HandleState::Open(file)),
        })
    }

    /// Path of the queue file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configuration this handle was opened with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether `delete` has been called on this handle
    pub fn is_deleted(&self) -> bool {
        matches!(*self.state.lock(), HandleState::Deleted)
    }

    // =========================================================================
    // Mutating Operations (exclusive lock)
    // =========================================================================

    /// Append a payload at the tail
    ///
    /// Returns the queue length after the insert.
    pub fn enqueue(&self, payload: &[u8]) -> Result<u32> {
        // Rejected before taking the lock; write_record checks again for direct callers
        if payload.is_empty() {
            return Err(QueueError::EmptyPayload);
        }
        if u32::try_from(payload.len()).is_err() {
            return Err(QueueError::PayloadTooLarge { len: payload.len() });
        }
        let record_len = encoded_len(payload.len());

        self.with_lock(LockMode::Exclusive, |mut file| {
            let index = read_index(&mut file)?.unwrap_or_else(IndexHeader::fresh);

            let end = u32::try_from(u64::from(index.end) + record_len)
                .map_err(|_| QueueError::QueueFull)?;
            let len = index.len.checked_add(1).ok_or(QueueError::QueueFull)?;

            file.seek(SeekFrom::Start(u64::from(index.end)))?;
            write_record(&mut file, payload)?;
            write_index(
                &mut file,
                &IndexHeader {
                    start: index.start,
                    end,
                    len,
                },
            )?;
            self.sync(file)?;

            tracing::trace!("Enqueued {} bytes, len={}", payload.len(), len);
            Ok(len)
        })
    }

    /// Remove and return the payload at the head
    ///
    /// Returns `Ok(None)` when the queue is empty. Dequeuing the last record
    /// truncates the file to zero bytes; moving the read cursor past
    /// `compaction_threshold` compacts the file.
    pub fn dequeue(&self) -> Result<Option<Vec<u8>>> {
        self.with_lock(LockMode::Exclusive, |mut file| {
            let Some(index) = read_index(&mut file)? else {
                return Ok(None);
            };

            let start = u64::from(index.start);
            let end = u64::from(index.end);

            file.seek(SeekFrom::Start(start))?;
            let len = read_length(&mut file)?;
            if len == 0 {
                return Err(QueueError::ZeroLengthRecord { offset: start });
            }

            // Bound the length by the index before allocating the payload
            let pos = start + encoded_len(len as usize);
            if pos > end {
                return Err(QueueError::Corrupt(format!(
                    "record at offset {} runs past end offset {}",
                    start, end
                )));
            }
            let payload = read_record(&mut file, len)?;

            if pos < end {
                let remaining = index.len.checked_sub(1).ok_or_else(|| {
                    QueueError::Corrupt(format!(
                        "index reports 0 records but data remains up to offset {}",
                        end
                    ))
                })?;

                if pos > self.config.compaction_threshold {
                    compactor::compact(
                        file,
                        pos,
                        end,
                        remaining,
                        self.config.compaction_chunk_size,
                    )?;
                } else {
                    write_index(
                        &mut file,
                        &IndexHeader {
                            // pos < end <= u32::MAX
                            start: pos as u32,
                            end: index.end,
                            len: remaining,
                        },
                    )?;
                }
                tracing::trace!("Dequeued {} bytes, len={}", len, remaining);
            } else {
                file.set_len(0)?;
                tracing::trace!("Dequeued {} bytes, queue drained", len);
            }
            self.sync(file)?;

            Ok(Some(payload))
        })
    }

    /// Drop every queued record, returning the file to zero length
    pub fn clear(&self) -> Result<()> {
        self.with_lock(LockMode::Exclusive, |file| {
            file.set_len(0)?;
            self.sync(file)?;
            tracing::debug!("Cleared queue at {}", self.path.display());
            Ok(())
        })
    }

    /// Remove the queue file and retire this handle
    ///
    /// The file is unlinked while the exclusive lock is held, then the handle
    /// is closed. Every later call on this `Queue` fails with `Deleted`.
    pub fn delete(&self) -> Result<()> {
        let mut state = self.state.lock();
        let file = match &*state {
            HandleState::Open(file) => file,
            HandleState::Deleted => return Err(QueueError::Deleted),
        };

        {
            let _lock = FileLock::acquire(file, LockMode::Exclusive)?;
            fs::remove_file(&self.path)?;
        }

        // Dropping the File closes the descriptor.
        *state = HandleState::Deleted;
        tracing::debug!("Deleted queue at {}", self.path.display());

        Ok(())
    }

    // =========================================================================
    // Read-only Operations (shared lock)
    // =========================================================================

    /// Peek at queued payloads without consuming them
    ///
    /// Skips the first `offset` records and returns up to `limit` of the
    /// following ones, oldest first. A `limit` of 0 means no limit.
    pub fn items(&self, offset: usize, limit: usize) -> Result<Vec<Vec<u8>>> {
        self.with_lock(LockMode::Shared, |mut file| {
            let Some(index) = read_index(&mut file)? else {
                return Ok(Vec::new());
            };

            let mut walker = RecordWalker::new(file, &index)?;
            let mut items = Vec::new();
            let mut skipped = 0;

            while let Some(len) = walker.next_length()? {
                if skipped < offset {
                    walker.skip_payload(len)?;
                    skipped += 1;
                    continue;
                }

                items.push(walker.read_payload(len)?);
                if limit != 0 && items.len() >= limit {
                    break;
                }
            }

            Ok(items)
        })
    }

    /// The payload the next `dequeue` would return, left in place
    pub fn peek(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.items(0, 1)?.into_iter().next())
    }

    /// Number of queued records
    pub fn count(&self) -> Result<u32> {
        self.with_lock(LockMode::Shared, |mut file| {
            Ok(read_index(&mut file)?.map_or(0, |index| index.len))
        })
    }

    /// True when the file holds no index
    pub fn is_empty(&self) -> Result<bool> {
        self.with_lock(LockMode::Shared, |mut file| {
            Ok(read_index(&mut file)?.is_none())
        })
    }

    /// Cursor positions and file size
    pub fn stats(&self) -> Result<QueueStats> {
        self.with_lock(LockMode::Shared, |mut file| {
            let file_size = file.metadata()?.len();

            let stats = match read_index(&mut file)? {
                Some(index) => QueueStats {
                    len: index.len,
                    start: u64::from(index.start),
                    end: u64::from(index.end),
                    file_size,
                    dead_bytes: index.dead_bytes(),
                },
                None => QueueStats {
                    len: 0,
                    start: 0,
                    end: 0,
                    file_size,
                    dead_bytes: 0,
                },
            };

            Ok(stats)
        })
    }

    /// Walk every record and check it against the index
    ///
    /// Nothing is modified. Fails on a zero-length record, a record that runs
    /// past `end`, or a record count that disagrees with the index.
    pub fn verify(&self) -> Result<VerifyReport> {
        self.with_lock(LockMode::Shared, |mut file| {
            let Some(index) = read_index(&mut file)? else {
                return Ok(VerifyReport {
                    records: 0,
                    payload_bytes: 0,
                });
            };

            let mut walker = RecordWalker::new(file, &index)?;
            let mut records: u32 = 0;
            let mut payload_bytes = 0;

            while let Some(len) = walker.next_length()? {
                walker.skip_payload(len)?;
                records = records.saturating_add(1);
                payload_bytes += u64::from(len);
            }

            if records != index.len {
                return Err(QueueError::Corrupt(format!(
                    "index reports {} records, found {}",
                    index.len, records
                )));
            }

            Ok(VerifyReport {
                records,
                payload_bytes,
            })
        })
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Run `op` on the open file while holding a lock of the given mode
    ///
    /// The in-process mutex is taken first, then the file lock; both are
    /// released when `op` returns, whatever the outcome.
    fn with_lock<T>(&self, mode: LockMode, op: impl FnOnce(&File) -> Result<T>) -> Result<T> {
        let state = self.state.lock();
        let file = match &*state {
            HandleState::Open(file) => file,
            HandleState::Deleted => return Err(QueueError::Deleted),
        };

        let lock = FileLock::acquire(file, mode)?;
        let result = op(lock.file());
        drop(lock);

        result
    }

    fn sync(&self, file: &File) -> Result<()> {
        if self.config.sync_strategy == SyncStrategy::EveryWrite {
            file.sync_data()?;
        }
        Ok(())
    }
}

/// Sequential reader over the records in `[start, end)`
///
/// Each `next_length` must be followed by exactly one `read_payload` or
/// `skip_payload` for the same length.
struct RecordWalker<'a> {
    reader: BufReader<&'a File>,
    pos: u64,
    end: u64,
}

impl<'a> RecordWalker<'a> {
    fn new(file: &'a File, index: &IndexHeader) -> Result<Self> {
        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(u64::from(index.start)))?;

        Ok(Self {
            reader,
            pos: u64::from(index.start),
            end: u64::from(index.end),
        })
    }

    /// Length of the next record, or `None` once `end` is reached
    fn next_length(&mut self) -> Result<Option<u32>> {
        if self.pos >= self.end {
            return Ok(None);
        }

        let len = read_length(&mut self.reader)?;
        if len == 0 {
            return Err(QueueError::ZeroLengthRecord { offset: self.pos });
        }

        let next = self.pos + encoded_len(len as usize);
        if next > self.end {
            return Err(QueueError::Corrupt(format!(
                "record at offset {} runs past end offset {}",
                self.pos, self.end
            )));
        }

        self.pos = next;
        Ok(Some(len))
    }

    fn read_payload(&mut self, len: u32) -> Result<Vec<u8>> {
        read_record(&mut self.reader, len)
    }

    fn skip_payload(&mut self, len: u32) -> Result<()> {
        self.reader.seek_relative(i64::from(len))?;
        Ok(())
    }
}
