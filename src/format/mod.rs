//! Queue File Format
//!
//! On-disk layout shared by every process that opens the queue.
//!
//! ## Responsibilities
//! - Encode/decode the fixed 16-byte index header at offset 0
//! - XOR checksum validation on every header read
//! - Length-prefixed record framing in the data region
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Index Header (16 bytes, little-endian u32 fields)       │
//! │   Start (4) | End (4) | Len (4) | Checksum (4)          │
//! │   Checksum = Start ^ End ^ Len                          │
//! ├─────────────────────────────────────────────────────────┤
//! │ Dead space (already dequeued records, [16, Start))      │
//! ├─────────────────────────────────────────────────────────┤
//! │ Data Region [Start, End)                                │
//! │   [Length: u32][Payload]                                │
//! │   ... repeated Len times, Length is never 0 ...         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! A zero-length file is an empty queue that has never been written (or was
//! drained / cleared). The header only exists while at least one record is
//! queued.

pub mod index;
pub mod record;

use std::io::{self, Read};

pub use index::{read_index, write_index, IndexHeader};
pub use record::{read_length, read_record, write_record};

/// Index header size: Start (4) + End (4) + Len (4) + Checksum (4) = 16 bytes
pub const HEADER_SIZE: u64 = 16;

/// Record length prefix size
pub const LENGTH_PREFIX_SIZE: u64 = 4;

/// Read until `buf` is full or EOF is reached, returning the bytes read.
///
/// Unlike `read_exact`, a short read is not an error: both the header and the
/// length prefix treat a truncated tail as "nothing there".
pub(crate) fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
