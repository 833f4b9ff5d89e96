//! Classic pcap replay over any `Read` source, using `pcap_parser`.

use std::io::{BufReader, Read};

use bytes::Bytes;
use pcap_parser::traits::PcapReaderIterator;
use pcap_parser::{LegacyPcapReader, PcapBlockOwned};
use tracing::debug;

use super::LINKTYPE_ETHERNET;
use crate::error::{Error, PcapError};
use crate::io::{PacketReader, RawPacket};

/// Buffer size for the pcap_parser reader.
const BUFFER_SIZE: usize = 262144;

/// Byte order and timestamp resolution of a classic pcap file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PcapFormat {
    /// Little-endian, microseconds
    LeMicro,
    /// Big-endian, microseconds
    BeMicro,
    /// Little-endian, nanoseconds
    LeNano,
    /// Big-endian, nanoseconds
    BeNano,
}

impl PcapFormat {
    /// Detect the format from the first four bytes of a file.
    pub fn detect(data: &[u8]) -> Result<Self, Error> {
        match data.get(..4) {
            Some([0xd4, 0xc3, 0xb2, 0xa1]) => Ok(PcapFormat::LeMicro),
            Some([0xa1, 0xb2, 0xc3, 0xd4]) => Ok(PcapFormat::BeMicro),
            Some([0x4d, 0x3c, 0xb2, 0xa1]) => Ok(PcapFormat::LeNano),
            Some([0xa1, 0xb2, 0x3c, 0x4d]) => Ok(PcapFormat::BeNano),
            Some(m) => Err(invalid(format_args!(
                "bad magic {:02x}{:02x}{:02x}{:02x}",
                m[0], m[1], m[2], m[3]
            ))),
            None => Err(invalid("file shorter than its magic number")),
        }
    }

    pub fn is_nanosecond(&self) -> bool {
        matches!(self, PcapFormat::LeNano | PcapFormat::BeNano)
    }
}

fn invalid(reason: impl std::fmt::Display) -> Error {
    Error::Pcap(PcapError::InvalidFormat {
        reason: reason.to_string(),
    })
}

/// Reader for classic pcap files.
pub struct PcapReader<R: Read> {
    inner: LegacyPcapReader<BufReader<R>>,
    frame_number: u64,
    link_type: u32,
    nanosecond: bool,
}

/// What one step of the underlying block reader produced.
enum Step {
    Header { link_type: u32, nanosecond: bool },
    Packet(RawPacket),
    Skipped,
    End,
}

impl<R: Read> PcapReader<R> {
    /// Create a reader, consuming the file header.
    pub fn new(source: R) -> Result<Self, Error> {
        let inner = LegacyPcapReader::new(BUFFER_SIZE, BufReader::with_capacity(BUFFER_SIZE, source))
            .map_err(invalid)?;

        let mut reader = PcapReader {
            inner,
            frame_number: 0,
            link_type: LINKTYPE_ETHERNET,
            nanosecond: false,
        };
        match reader.step()? {
            Step::Header {
                link_type,
                nanosecond,
            } => {
                reader.link_type = link_type;
                reader.nanosecond = nanosecond;
                Ok(reader)
            }
            _ => Err(invalid("missing file header")),
        }
    }

    /// Link type from the file header (1 = Ethernet).
    pub fn link_type(&self) -> u32 {
        self.link_type
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_number
    }

    /// Pull the next complete block, refilling the buffer as needed.
    fn step(&mut self) -> Result<Step, Error> {
        use pcap_parser::PcapError as ParseError;

        loop {
            let (offset, step) = match self.inner.next() {
                Ok((offset, PcapBlockOwned::LegacyHeader(header))) => {
                    debug!(
                        link_type = header.network.0,
                        snaplen = header.snaplen,
                        "pcap header"
                    );
                    let step = Step::Header {
                        link_type: header.network.0 as u32,
                        nanosecond: header.is_nanosecond_precision(),
                    };
                    (offset, step)
                }
                Ok((offset, PcapBlockOwned::Legacy(record))) => {
                    self.frame_number += 1;
                    let sub_second = if self.nanosecond {
                        u64::from(record.ts_usec)
                    } else {
                        u64::from(record.ts_usec) * 1_000
                    };
                    let packet = RawPacket {
                        frame_number: self.frame_number,
                        timestamp_ns: u64::from(record.ts_sec) * 1_000_000_000 + sub_second,
                        original_len: record.origlen,
                        data: Bytes::copy_from_slice(record.data),
                    };
                    (offset, Step::Packet(packet))
                }
                Ok((offset, _)) => (offset, Step::Skipped),
                Err(ParseError::Eof) => return Ok(Step::End),
                Err(ParseError::UnexpectedEof) => {
                    debug!(frame = self.frame_number, "truncated pcap record, stopping");
                    return Ok(Step::End);
                }
                Err(ParseError::Incomplete(_)) => {
                    self.inner.refill().map_err(invalid)?;
                    continue;
                }
                Err(e) => return Err(invalid(e)),
            };
            self.inner.consume(offset);
            return Ok(step);
        }
    }
}

impl<R: Read> PacketReader for PcapReader<R> {
    fn next_packet(&mut self) -> Result<Option<RawPacket>, Error> {
        loop {
            match self.step()? {
                Step::Packet(packet) => return Ok(Some(packet)),
                Step::End => return Ok(None),
                Step::Header { .. } | Step::Skipped => continue,
            }
        }
    }
}
