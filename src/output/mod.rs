//! Writing matched packets to stdout.

mod text;

use std::io::{self, Write};

use snoopy_core::io::TraceWriter;
use snoopy_core::pcap::PcapWriter;
use snoopy_core::{ProtoId, ProtocolRegistry, RawPacket};

use crate::cli::OutputMode;

pub use text::TextPrinter;

/// Destination for packets that passed the filter.
pub enum PacketSink<'r, W: Write> {
    Text(TextPrinter<'r, W>),
    Trace(TraceWriter<W>),
    Pcap(PcapWriter<W>),
}

impl<'r, W: Write> PacketSink<'r, W> {
    /// Create the sink for `mode`. A pcap sink writes its file header here.
    ///
    /// `start_ns` anchors text timestamps; `None` uses the first packet.
    pub fn new(
        mode: OutputMode,
        registry: &'r ProtocolRegistry,
        root: ProtoId,
        max_capture: Option<u32>,
        start_ns: Option<u64>,
        out: W,
    ) -> io::Result<Self> {
        Ok(match mode {
            OutputMode::Text { single_line } => {
                let printer = TextPrinter::new(registry, root, single_line, out);
                PacketSink::Text(match start_ns {
                    Some(start) => printer.with_start(start),
                    None => printer,
                })
            }
            OutputMode::Trace => {
                PacketSink::Trace(TraceWriter::new(out, max_capture.map(|m| m as usize)))
            }
            OutputMode::Pcap => {
                let link_layer = registry.name(root) == "ether";
                PacketSink::Pcap(PcapWriter::new(out, max_capture, !link_layer)?)
            }
        })
    }

    pub fn write_packet(&mut self, pkt: &RawPacket) -> io::Result<()> {
        match self {
            PacketSink::Text(printer) => printer.write_packet(pkt),
            PacketSink::Trace(writer) => writer.write_packet(pkt.timestamp_ns, &pkt.data),
            PacketSink::Pcap(writer) => writer.write_packet(pkt.timestamp_ns, &pkt.data),
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match self {
            PacketSink::Text(printer) => printer.flush(),
            PacketSink::Trace(writer) => writer.flush(),
            PacketSink::Pcap(writer) => writer.flush(),
        }
    }

    /// Whether the sink writes binary records.
    pub fn is_binary(&self) -> bool {
        !matches!(self, PacketSink::Text(_))
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use snoopy_core::default_registry;
    use snoopy_core::pcap::FAKE_ETHERNET_HEADER;

    fn packet(data: &[u8]) -> RawPacket {
        RawPacket {
            frame_number: 1,
            timestamp_ns: 0,
            original_len: data.len() as u32,
            data: Bytes::copy_from_slice(data),
        }
    }

    fn pcap_output(root: &str) -> Vec<u8> {
        let registry = default_registry();
        let root = registry.lookup(root).unwrap();
        let mut sink =
            PacketSink::new(OutputMode::Pcap, &registry, root, None, None, Vec::new()).unwrap();
        sink.write_packet(&packet(&[0x45; 20])).unwrap();
        assert!(sink.is_binary());
        match sink {
            PacketSink::Pcap(writer) => writer.into_inner(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_pcap_fakes_link_layer_for_ip_root() {
        let out = pcap_output("ip");
        assert_eq!(out.len(), 24 + 16 + 14 + 20);
        assert_eq!(&out[40..54], &FAKE_ETHERNET_HEADER);
    }

    #[test]
    fn test_pcap_keeps_ether_frames() {
        let out = pcap_output("ether");
        assert_eq!(out.len(), 24 + 16 + 20);
    }

    #[test]
    fn test_trace_sink_truncates() {
        let registry = default_registry();
        let root = registry.lookup("ether").unwrap();
        let mut sink =
            PacketSink::new(OutputMode::Trace, &registry, root, Some(8), None, Vec::new()).unwrap();
        sink.write_packet(&packet(&[1; 30])).unwrap();
        match sink {
            PacketSink::Trace(writer) => assert_eq!(writer.into_inner().len(), 10 + 8),
            _ => unreachable!(),
        }
    }
}
