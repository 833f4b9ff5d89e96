//! Nanosecond pcap output.

use std::io::{self, Write};

/// Magic for nanosecond-resolution classic pcap, written in native byte order.
pub const PCAP_NANO_MAGIC: u32 = 0xa1b2_3c4d;

const VERSION_MAJOR: u16 = 2;
const VERSION_MINOR: u16 = 4;

/// Link-layer header prepended to packets whose root is not Ethernet.
/// Ethertype is IPv4.
pub const FAKE_ETHERNET_HEADER: [u8; 14] = [
    0x00, 0x00, 0x00, 0x01, 0x02, 0x03, 0x00, 0x00, 0x00, 0x04, 0x05, 0x06, 0x08, 0x00,
];

/// Writer for a pcap stream with Ethernet link type.
pub struct PcapWriter<W: Write> {
    out: W,
    max_len: Option<usize>,
    fake_ethernet: bool,
}

impl<W: Write> PcapWriter<W> {
    /// Write the file header and return the writer.
    ///
    /// `max_len` truncates every packet and becomes the header's snaplen.
    /// With `fake_ethernet` set, each packet gets [`FAKE_ETHERNET_HEADER`]
    /// in front, counted in both recorded lengths.
    pub fn new(mut out: W, max_len: Option<u32>, fake_ethernet: bool) -> io::Result<Self> {
        let mut hdr = Vec::with_capacity(24);
        hdr.extend_from_slice(&PCAP_NANO_MAGIC.to_ne_bytes());
        hdr.extend_from_slice(&VERSION_MAJOR.to_ne_bytes());
        hdr.extend_from_slice(&VERSION_MINOR.to_ne_bytes());
        hdr.extend_from_slice(&0i32.to_ne_bytes());
        hdr.extend_from_slice(&0u32.to_ne_bytes());
        hdr.extend_from_slice(&max_len.unwrap_or(u32::MAX).to_ne_bytes());
        hdr.extend_from_slice(&super::LINKTYPE_ETHERNET.to_ne_bytes());
        out.write_all(&hdr)?;

        Ok(Self {
            out,
            max_len: max_len.map(|m| m as usize),
            fake_ethernet,
        })
    }

    pub fn write_packet(&mut self, timestamp_ns: u64, data: &[u8]) -> io::Result<()> {
        let data = match self.max_len {
            Some(max) if data.len() > max => &data[..max],
            _ => data,
        };
        let prefix: &[u8] = if self.fake_ethernet {
            &FAKE_ETHERNET_HEADER
        } else {
            &[]
        };
        let len = (prefix.len() + data.len()) as u32;

        let mut hdr = [0u8; 16];
        hdr[0..4].copy_from_slice(&((timestamp_ns / 1_000_000_000) as u32).to_ne_bytes());
        hdr[4..8].copy_from_slice(&((timestamp_ns % 1_000_000_000) as u32).to_ne_bytes());
        hdr[8..12].copy_from_slice(&len.to_ne_bytes());
        hdr[12..16].copy_from_slice(&len.to_ne_bytes());

        self.out.write_all(&hdr)?;
        self.out.write_all(prefix)?;
        self.out.write_all(data)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::io::PacketReader;
    use crate::pcap::PcapReader;

    fn ne_u32(bytes: &[u8]) -> u32 {
        u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    #[test]
    fn test_file_header() {
        let out = PcapWriter::new(Vec::new(), None, false).unwrap().into_inner();
        assert_eq!(out.len(), 24);
        assert_eq!(ne_u32(&out[0..4]), PCAP_NANO_MAGIC);
        assert_eq!(ne_u32(&out[16..20]), u32::MAX);
        assert_eq!(ne_u32(&out[20..24]), 1);

        let out = PcapWriter::new(Vec::new(), Some(96), false).unwrap().into_inner();
        assert_eq!(ne_u32(&out[16..20]), 96);
    }

    #[test]
    fn test_record_truncated_then_faked() {
        let mut writer = PcapWriter::new(Vec::new(), Some(4), true).unwrap();
        writer.write_packet(3_000_000_042, &[1, 2, 3, 4, 5, 6]).unwrap();
        let out = writer.into_inner();
        let rec = &out[24..];

        assert_eq!(ne_u32(&rec[0..4]), 3);
        assert_eq!(ne_u32(&rec[4..8]), 42);
        assert_eq!(ne_u32(&rec[8..12]), 18);
        assert_eq!(ne_u32(&rec[12..16]), 18);
        assert_eq!(&rec[16..30], &FAKE_ETHERNET_HEADER);
        assert_eq!(&rec[30..], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_readable_by_pcap_parser() {
        let mut writer = PcapWriter::new(Vec::new(), None, true).unwrap();
        writer.write_packet(10_000_000_007, &[0x45; 20]).unwrap();

        let mut reader = PcapReader::new(Cursor::new(writer.into_inner())).unwrap();
        assert_eq!(reader.link_type(), 1);
        let pkt = reader.next_packet().unwrap().unwrap();
        assert_eq!(pkt.timestamp_ns, 10_000_000_007);
        assert_eq!(&pkt.data[..14], &FAKE_ETHERNET_HEADER);
        assert_eq!(pkt.data.len(), 34);
    }
}
