//! Index Header codec
//!
//! Reads and writes the fixed-size header at file offset 0.

use std::io::{Read, Seek, SeekFrom, Write};

use bytes::{Buf, BufMut};

use crate::error::{QueueError, Result};

use super::{read_full, HEADER_SIZE};

/// The queue's read/write cursors and item count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexHeader {
    /// Offset of the first unread record
    pub start: u32,
    /// Offset one past the last written byte
    pub end: u32,
    /// Number of queued records
    pub len: u32,
}

impl IndexHeader {
    /// Header for a queue that holds no records yet: both cursors sit right
    /// after the header.
    pub fn fresh() -> Self {
        Self {
            start: HEADER_SIZE as u32,
            end: HEADER_SIZE as u32,
            len: 0,
        }
    }

    pub fn checksum(&self) -> u32 {
        self.start ^ self.end ^ self.len
    }

    /// Bytes already consumed between the header and `start`
    pub fn dead_bytes(&self) -> u64 {
        u64::from(self.start).saturating_sub(HEADER_SIZE)
    }

    /// Bytes occupied by queued records
    pub fn live_bytes(&self) -> u64 {
        u64::from(self.end.saturating_sub(self.start))
    }

    /// Encode as `start, end, len, checksum`, little-endian
    pub fn encode(&self) -> [u8; HEADER_SIZE as usize] {
        let mut out = [0u8; HEADER_SIZE as usize];
        let mut buf = &mut out[..];
        buf.put_u32_le(self.start);
        buf.put_u32_le(self.end);
        buf.put_u32_le(self.len);
        buf.put_u32_le(self.checksum());
        out
    }

    /// Decode and validate a raw header
    ///
    /// Fails with `IndexCorrupt` on a checksum mismatch and with `Corrupt`
    /// when the cursors are out of order.
    pub fn decode(raw: &[u8; HEADER_SIZE as usize]) -> Result<Self> {
        let mut buf = &raw[..];
        let start = buf.get_u32_le();
        let end = buf.get_u32_le();
        let len = buf.get_u32_le();
        let checksum = buf.get_u32_le();

        let header = Self { start, end, len };
        if header.checksum() != checksum {
            return Err(QueueError::IndexCorrupt {
                start,
                end,
                len,
                checksum,
            });
        }

        if u64::from(start) < HEADER_SIZE || start > end {
            return Err(QueueError::Corrupt(format!(
                "index cursors out of order: start={} end={}",
                start, end
            )));
        }

        Ok(header)
    }
}

/// Read the header at offset 0
///
/// Returns `Ok(None)` when fewer than `HEADER_SIZE` bytes are available: the
/// queue is empty.
pub fn read_index<R: Read + Seek>(reader: &mut R) -> Result<Option<IndexHeader>> {
    reader.seek(SeekFrom::Start(0))?;

    let mut raw = [0u8; HEADER_SIZE as usize];
    let n = read_full(reader, &mut raw)?;
    if n < raw.len() {
        if n > 0 {
            tracing::warn!("Ignoring {} byte header fragment, treating queue as empty", n);
        }
        return Ok(None);
    }

    IndexHeader::decode(&raw).map(Some)
}

/// Write `header` (with its checksum) at offset 0 in a single write
pub fn write_index<W: Write + Seek>(writer: &mut W, header: &IndexHeader) -> Result<()> {
    writer.seek(SeekFrom::Start(0))?;
    writer.write_all(&header.encode())?;
    Ok(())
}
