//! Packet I/O.
//!
//! Every input is read through the [`PacketReader`] trait:
//!
//! - [`TraceReader`] - snoopy's native length/timestamp record framing
//! - [`PcapReader`](crate::pcap::PcapReader) - classic pcap capture files
//! - [`FramedReader`] - a raw byte stream cut into packets by the root
//!   protocol's framer
//!
//! [`open_replay`] picks between the first two by looking at the file magic.

mod framed;
mod trace;

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use tracing::info;

use crate::error::Error;
use crate::pcap::{PcapFormat, PcapReader};

pub use framed::FramedReader;
pub use trace::{TraceReader, TraceWriter, TRACE_HEADER_LEN};

/// Largest packet any reader hands out.
pub const MAX_PACKET_LEN: usize = 64 * 1024;

/// Raw packet data from a reader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawPacket {
    /// Frame number (1-indexed)
    pub frame_number: u64,
    /// Timestamp in nanoseconds since Unix epoch
    pub timestamp_ns: u64,
    /// Length on the wire, at least `data.len()`
    pub original_len: u32,
    /// Packet data
    pub data: Bytes,
}

/// Sequential reader of packets.
pub trait PacketReader {
    /// Read the next packet.
    ///
    /// Returns `Ok(None)` at end of input, including a truncated last record.
    fn next_packet(&mut self) -> Result<Option<RawPacket>, Error>;

    /// Read up to `max` packets into `buffer`, which is cleared first.
    ///
    /// Returns the number of packets read (0 means EOF).
    #[inline]
    fn read_batch(&mut self, buffer: &mut Vec<RawPacket>, max: usize) -> Result<usize, Error> {
        buffer.clear();
        buffer.reserve(max);
        while buffer.len() < max {
            match self.next_packet()? {
                Some(pkt) => buffer.push(pkt),
                None => break,
            }
        }
        Ok(buffer.len())
    }
}

impl<T: PacketReader + ?Sized> PacketReader for Box<T> {
    fn next_packet(&mut self) -> Result<Option<RawPacket>, Error> {
        (**self).next_packet()
    }
}

/// An opened recording.
pub struct Replay {
    pub reader: Box<dyn PacketReader>,
    /// pcap link type, `None` for native trace records
    pub link_type: Option<u32>,
}

/// Open a recorded trace, either native records or a classic pcap file.
pub fn open_replay<P: AsRef<Path>>(path: P) -> Result<Replay, Error> {
    let path = path.as_ref();
    let mut file = File::open(path)?;

    let mut magic = [0u8; 4];
    let n = read_up_to(&mut file, &mut magic)?;
    file.seek(SeekFrom::Start(0))?;

    match PcapFormat::detect(&magic[..n]) {
        Ok(format) => {
            let reader = PcapReader::new(file)?;
            let link_type = reader.link_type();
            info!(path = %path.display(), ?format, link_type, "replaying pcap file");
            Ok(Replay {
                reader: Box::new(reader),
                link_type: Some(link_type),
            })
        }
        Err(_) => {
            info!(path = %path.display(), "replaying trace file");
            Ok(Replay {
                reader: Box::new(TraceReader::new(BufReader::new(file))),
                link_type: None,
            })
        }
    }
}

/// Current wall clock in nanoseconds since the Unix epoch.
pub fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Fill as much of `buf` as the source allows, stopping early only at EOF.
pub(crate) fn read_up_to<R: Read + ?Sized>(src: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match src.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
