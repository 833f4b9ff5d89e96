//! Human-readable packet lines.

use std::io::{self, Write};

use snoopy_core::{print_packet, ProtoId, ProtocolRegistry, RawPacket};

/// Decodes each packet from the root protocol and prints it, prefixed with
/// the milliseconds elapsed since the start time.
pub struct TextPrinter<'r, W: Write> {
    registry: &'r ProtocolRegistry,
    root: ProtoId,
    single_line: bool,
    /// Taken from the first packet when not set up front
    start_ns: Option<u64>,
    line: String,
    out: W,
}

impl<'r, W: Write> TextPrinter<'r, W> {
    pub fn new(registry: &'r ProtocolRegistry, root: ProtoId, single_line: bool, out: W) -> Self {
        Self {
            registry,
            root,
            single_line,
            start_ns: None,
            line: String::with_capacity(256),
            out,
        }
    }

    /// Measure times from `start_ns` instead of the first packet.
    pub fn with_start(mut self, start_ns: u64) -> Self {
        self.start_ns = Some(start_ns);
        self
    }

    pub fn write_packet(&mut self, pkt: &RawPacket) -> io::Result<()> {
        let start = *self.start_ns.get_or_insert(pkt.timestamp_ns);
        let dt = (pkt.timestamp_ns.saturating_sub(start) / 1_000_000) as u32;

        self.line.clear();
        self.line.push_str(&format!("{dt:06} ms "));
        print_packet(
            self.registry,
            self.root,
            &pkt.data,
            self.single_line,
            &mut self.line,
        );
        self.line.push('\n');
        self.out.write_all(self.line.as_bytes())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
