//! Record codec
//!
//! Length-prefixed payload framing: `[Length: u32 LE][Payload]`.

use std::io::{Read, Write};

use bytes::{BufMut, BytesMut};

use crate::error::{QueueError, Result};

use super::{read_full, LENGTH_PREFIX_SIZE};

/// Read a length prefix at the current position
///
/// A short or absent read yields 0, which callers treat as corruption.
pub fn read_length<R: Read>(reader: &mut R) -> Result<u32> {
    let mut raw = [0u8; LENGTH_PREFIX_SIZE as usize];
    if read_full(reader, &mut raw)? < raw.len() {
        return Ok(0);
    }
    Ok(u32::from_le_bytes(raw))
}

/// Read exactly `len` payload bytes following a length prefix
pub fn read_record<R: Read>(reader: &mut R, len: u32) -> Result<Vec<u8>> {
    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

/// Write the length prefix and payload contiguously at the current position
///
/// Returns the number of bytes written (prefix included). Empty and oversized
/// payloads are rejected before anything is written; `Queue::enqueue` repeats
/// the check so it can fail without taking the file lock.
pub fn write_record<W: Write>(writer: &mut W, payload: &[u8]) -> Result<u64> {
    if payload.is_empty() {
        return Err(QueueError::EmptyPayload);
    }
    let len = u32::try_from(payload.len())
        .map_err(|_| QueueError::PayloadTooLarge { len: payload.len() })?;

    let mut frame = BytesMut::with_capacity(LENGTH_PREFIX_SIZE as usize + payload.len());
    frame.put_u32_le(len);
    frame.put_slice(payload);
    writer.write_all(&frame)?;

    Ok(frame.len() as u64)
}

/// Total on-disk size of a record carrying `payload_len` bytes
pub fn encoded_len(payload_len: usize) -> u64 {
    LENGTH_PREFIX_SIZE + payload_len as u64
}
