//! Native trace records.
//!
//! Each record is a 10-byte header followed by the packet:
//!
//! ```text
//! +--------+----------------+----------------+----------------
//! | len    | time (high 32) | time (low 32)  | len bytes ...
//! | u16 BE | u32 BE         | u32 BE         |
//! +--------+----------------+----------------+----------------
//! ```
//!
//! The time is nanoseconds since the Unix epoch.

use std::io::{self, Read, Write};

use bytes::Bytes;
use tracing::debug;

use super::{read_up_to, PacketReader, RawPacket};
use crate::error::Error;

pub const TRACE_HEADER_LEN: usize = 10;

/// Reader for native trace records.
pub struct TraceReader<R: Read> {
    src: R,
    frame_number: u64,
}

impl<R: Read> TraceReader<R> {
    pub fn new(src: R) -> Self {
        Self {
            src,
            frame_number: 0,
        }
    }
}

impl<R: Read> PacketReader for TraceReader<R> {
    fn next_packet(&mut self) -> Result<Option<RawPacket>, Error> {
        let mut hdr = [0u8; TRACE_HEADER_LEN];
        let n = read_up_to(&mut self.src, &mut hdr)?;
        if n != TRACE_HEADER_LEN {
            if n != 0 {
                debug!(have = n, "short trace record header, stopping");
            }
            return Ok(None);
        }

        let len = u16::from_be_bytes([hdr[0], hdr[1]]) as usize;
        let high = u32::from_be_bytes([hdr[2], hdr[3], hdr[4], hdr[5]]) as u64;
        let low = u32::from_be_bytes([hdr[6], hdr[7], hdr[8], hdr[9]]) as u64;

        let mut data = vec![0u8; len];
        let n = read_up_to(&mut self.src, &mut data)?;
        if n != len {
            debug!(needed = len, have = n, "short trace record, stopping");
            return Ok(None);
        }

        self.frame_number += 1;
        Ok(Some(RawPacket {
            frame_number: self.frame_number,
            timestamp_ns: (high << 32) | low,
            original_len: len as u32,
            data: Bytes::from(data),
        }))
    }
}

/// Writer for native trace records.
pub struct TraceWriter<W: Write> {
    out: W,
    max_len: usize,
}

impl<W: Write> TraceWriter<W> {
    /// Packets longer than `max_len` (or than a record can hold) are truncated.
    pub fn new(out: W, max_len: Option<usize>) -> Self {
        let limit = u16::MAX as usize;
        Self {
            out,
            max_len: max_len.map_or(limit, |m| m.min(limit)),
        }
    }

    pub fn write_packet(&mut self, timestamp_ns: u64, data: &[u8]) -> io::Result<()> {
        let data = &data[..data.len().min(self.max_len)];

        let mut hdr = [0u8; TRACE_HEADER_LEN];
        hdr[0..2].copy_from_slice(&(data.len() as u16).to_be_bytes());
        hdr[2..6].copy_from_slice(&((timestamp_ns >> 32) as u32).to_be_bytes());
        hdr[6..10].copy_from_slice(&(timestamp_ns as u32).to_be_bytes());

        self.out.write_all(&hdr)?;
        self.out.write_all(data)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
