//! Packet sources: trace replay, live capture and framed byte streams.

mod live;

use std::fs::File;
use std::io::BufReader;

use anyhow::{Context, Result};
use tracing::info;

use snoopy_core::io::{open_replay, FramedReader, PacketReader};
use snoopy_core::pcap::root_for_link_type;
use snoopy_core::{FilterError, ProtoId, ProtocolRegistry};

use crate::cli::{Config, Source};

pub use live::{default_interface, find_interface, LiveCapture};

/// Root protocol when nothing else decides.
pub const DEFAULT_ROOT: &str = "ether";

/// An opened packet source and the protocol its packets start with.
pub struct Capture<'r> {
    pub reader: Box<dyn PacketReader + 'r>,
    pub root: ProtoId,
    /// Packets to read per batch
    pub batch: usize,
}

/// Open the source named by `config`.
///
/// The root protocol is `config.root` when given, the pcap link type for
/// pcap replay, and [`DEFAULT_ROOT`] otherwise.
pub fn open<'r>(config: &Config, registry: &'r ProtocolRegistry) -> Result<Capture<'r>> {
    let lookup = |name: &str| {
        registry
            .lookup(name)
            .ok_or_else(|| FilterError::UnknownRoot(name.to_string()))
    };
    let explicit = config.root.as_deref().map(lookup).transpose()?;

    match &config.source {
        Source::Trace(path) => {
            let replay = open_replay(path)
                .with_context(|| format!("Failed to open trace file: {}", path.display()))?;
            let root = match (explicit, replay.link_type) {
                (Some(root), _) => root,
                (None, Some(link_type)) => lookup(root_for_link_type(link_type)?)?,
                (None, None) => lookup(DEFAULT_ROOT)?,
            };
            Ok(Capture {
                reader: replay.reader,
                root,
                batch: config.read_ahead,
            })
        }
        Source::Live(name) => {
            let iface = match name {
                Some(name) => find_interface(name)?,
                None => default_interface()?,
            };
            let reader = LiveCapture::open(&iface, config.read_ahead)
                .with_context(|| format!("Failed to open interface: {}", iface.name))?;
            Ok(Capture {
                reader: Box::new(reader),
                root: explicit.map_or_else(|| lookup(DEFAULT_ROOT), Ok)?,
                batch: 1,
            })
        }
        Source::Stream(path) => {
            let root = explicit.map_or_else(|| lookup(DEFAULT_ROOT), Ok)?;
            let file = File::open(path)
                .with_context(|| format!("Failed to open: {}", path.display()))?;
            info!(path = %path.display(), root = registry.name(root), "reading framed stream");
            let reader = FramedReader::new(registry.get(root), BufReader::new(file));
            Ok(Capture {
                reader: Box::new(reader),
                root,
                batch: 1,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::cli::OutputMode;
    use snoopy_core::default_registry;
    use snoopy_core::io::TraceWriter;
    use snoopy_core::pcap::PcapWriter;

    fn config(source: Source, root: Option<&str>) -> Config {
        Config {
            source,
            root: root.map(str::to_string),
            filter: None,
            output: OutputMode::Text { single_line: true },
            max_capture: None,
            read_ahead: 8,
        }
    }

    #[test]
    fn test_trace_defaults_to_ether() {
        let registry = default_registry();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        TraceWriter::new(file.as_file_mut(), None)
            .write_packet(1, &[0; 14])
            .unwrap();
        file.flush().unwrap();

        let capture = open(&config(Source::Trace(file.path().into()), None), &registry).unwrap();
        assert_eq!(registry.name(capture.root), "ether");
        assert_eq!(capture.batch, 8);
    }

    #[test]
    fn test_explicit_root_wins() {
        let registry = default_registry();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        PcapWriter::new(file.as_file_mut(), None, false).unwrap();
        file.flush().unwrap();

        let capture = open(
            &config(Source::Trace(file.path().into()), Some("ip")),
            &registry,
        )
        .unwrap();
        assert_eq!(registry.name(capture.root), "ip");
    }

    #[test]
    fn test_unknown_root() {
        let registry = default_registry();
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = open(
            &config(Source::Stream(file.path().into()), Some("token-ring")),
            &registry,
        )
        .err()
        .unwrap();
        assert_eq!(err.to_string(), "unknown protocol: token-ring");
    }

    #[test]
    fn test_stream_is_framed_by_root() {
        let registry = default_registry();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[7u8; 100]).unwrap();
        file.flush().unwrap();

        let mut capture =
            open(&config(Source::Stream(file.path().into()), None), &registry).unwrap();
        let pkt = capture.reader.next_packet().unwrap().unwrap();
        assert_eq!(pkt.data.len(), 100);
        assert!(capture.reader.next_packet().unwrap().is_none());
    }
}
