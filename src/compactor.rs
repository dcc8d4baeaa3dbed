//! Compactor
//!
//! Reclaims the dead space left in front of the read cursor by dequeues.
//!
//! ```text
//!  before:  [Header][ dead .............. ][ live records ]
//!                   16                    start            end
//!
//!  after:   [Header][ live records ]
//!                   16               16 + (end - start)
//! ```
//!
//! Live bytes are shifted forward chunk by chunk, then the file is truncated
//! and the header rewritten. The shift is done in place and is not
//! crash-atomic: a failure part way through leaves overwritten data behind a
//! stale header. Callers hold the exclusive lock for the whole run.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::{QueueError, Result};
use crate::format::{write_index, IndexHeader, HEADER_SIZE};

/// Shift `[start, end)` down to `HEADER_SIZE` and rewrite the index
///
/// `len` is the number of records left in the live region; it is written
/// unchanged. Returns the new header.
pub fn compact(file: &File, start: u64, end: u64, len: u32, chunk_size: usize) -> Result<IndexHeader> {
    if start < HEADER_SIZE || start > end {
        return Err(QueueError::Corrupt(format!(
            "cannot compact region start={} end={}",
            start, end
        )));
    }
    if chunk_size == 0 {
        return Err(QueueError::Config(
            "compaction_chunk_size must be greater than zero".to_string(),
        ));
    }

    let live = end - start;
    let mut buf = vec![0u8; chunk_size.min(live as usize).max(1)];
    let mut handle = file;

    // Destination always trails the source, so a forward copy never clobbers
    // bytes that have not been read yet.
    let mut read_pos = start;
    let mut write_pos = HEADER_SIZE;
    while read_pos < end {
        let n = ((end - read_pos) as usize).min(buf.len());

        handle.seek(SeekFrom::Start(read_pos))?;
        handle.read_exact(&mut buf[..n])?;
        handle.seek(SeekFrom::Start(write_pos))?;
        handle.write_all(&buf[..n])?;

        read_pos += n as u64;
        write_pos += n as u64;
    }

    handle.set_len(write_pos)?;

    let header = IndexHeader {
        start: HEADER_SIZE as u32,
        end: u32::try_from(write_pos).map_err(|_| QueueError::QueueFull)?,
        len,
    };
    write_index(&mut handle, &header)?;

    tracing::info!(
        "Compacted queue: moved {} live bytes, reclaimed {} bytes, {} records remain",
        live,
        start - HEADER_SIZE,
        len
    );

    Ok(header)
}
