//! Packets cut from a raw byte stream by the root protocol's framer.

use std::io::{ErrorKind, Read};

use bytes::Bytes;
use tracing::debug;

use super::{now_ns, PacketReader, RawPacket, MAX_PACKET_LEN};
use crate::error::Error;
use crate::protocol::Protocol;

/// Reader that asks a [`Protocol::frame`] implementation for each packet
/// and stamps it with the time it was read.
pub struct FramedReader<'p, R: Read> {
    protocol: &'p dyn Protocol,
    src: R,
    buf: Vec<u8>,
    frame_number: u64,
}

impl<'p, R: Read> FramedReader<'p, R> {
    pub fn new(protocol: &'p dyn Protocol, src: R) -> Self {
        Self::with_capacity(protocol, src, MAX_PACKET_LEN)
    }

    pub fn with_capacity(protocol: &'p dyn Protocol, src: R, capacity: usize) -> Self {
        Self {
            protocol,
            src,
            buf: vec![0u8; capacity],
            frame_number: 0,
        }
    }
}

impl<R: Read> PacketReader for FramedReader<'_, R> {
    fn next_packet(&mut self) -> Result<Option<RawPacket>, Error> {
        let n = match self.protocol.frame(&mut self.src, &mut self.buf) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                debug!(frame = self.frame_number, "truncated record, stopping");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        if n == 0 {
            return Ok(None);
        }
        self.frame_number += 1;
        Ok(Some(RawPacket {
            frame_number: self.frame_number,
            timestamp_ns: now_ns(),
            original_len: n as u32,
            data: Bytes::copy_from_slice(&self.buf[..n]),
        }))
    }
}
