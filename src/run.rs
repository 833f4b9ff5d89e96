//! The capture loop: read, filter, write.

use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::{debug, info};

use snoopy_core::io::{now_ns, PacketReader};
use snoopy_core::{CompiledFilter, Compiler, ProtocolRegistry};

use crate::capture;
use crate::cli::Config;
use crate::output::PacketSink;

/// Packet counts for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub read: u64,
    pub matched: u64,
}

/// Open the configured source, compile the filter against its root and copy
/// every matching packet to `out`. Diagnostics go to `diag`.
pub fn run<W: Write, D: Write>(
    config: &Config,
    registry: &ProtocolRegistry,
    out: W,
    mut diag: D,
) -> Result<Stats> {
    let mut capture = capture::open(config, registry)?;

    let compiler = Compiler::with_root(registry, capture.root);
    let filter = match config.filter.as_deref() {
        Some(text) => compiler.compile(text)?,
        None => compiler.accept_all(),
    };

    let mut sink = PacketSink::new(
        config.output,
        registry,
        capture.root,
        config.max_capture,
        config.source.is_live().then(now_ns),
        out,
    )
    .context("Failed to write output header")?;

    if filter.tree().is_some() && !sink.is_binary() {
        writeln!(diag, "after optimize: {filter}")?;
    }

    let stats = pump(&mut capture.reader, capture.batch, &filter, registry, &mut sink)?;
    info!(read = stats.read, matched = stats.matched, "done");
    Ok(stats)
}

/// Drain `reader` in batches of `batch` packets through `filter` into `sink`.
///
/// A closed output ends the loop without error.
pub fn pump<R, W>(
    reader: &mut R,
    batch: usize,
    filter: &CompiledFilter,
    registry: &ProtocolRegistry,
    sink: &mut PacketSink<'_, W>,
) -> Result<Stats>
where
    R: PacketReader + ?Sized,
    W: Write,
{
    let mut stats = Stats::default();
    let mut packets = Vec::with_capacity(batch);

    while reader.read_batch(&mut packets, batch)? > 0 {
        for pkt in &packets {
            stats.read += 1;
            if !filter.matches(registry, &pkt.data)? {
                continue;
            }
            stats.matched += 1;
            if let Err(e) = sink.write_packet(pkt) {
                return stop_on_closed_output(e, stats);
            }
        }
        if let Err(e) = sink.flush() {
            return stop_on_closed_output(e, stats);
        }
    }
    Ok(stats)
}

fn stop_on_closed_output(e: io::Error, stats: Stats) -> Result<Stats> {
    if e.kind() == io::ErrorKind::BrokenPipe {
        debug!("output closed");
        Ok(stats)
    } else {
        Err(e).context("Error writing to stdout")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::cli::OutputMode;
    use snoopy_core::default_registry;
    use snoopy_core::io::{TraceReader, TraceWriter};

    /// Ethernet/IPv4/UDP frame between two ports, no payload.
    fn udp_frame(sport: u16, dport: u16) -> Vec<u8> {
        let mut f = vec![0xff; 6];
        f.extend_from_slice(&[0, 0x11, 0x22, 0x33, 0x44, 0x55, 0x08, 0x00]);
        f.extend_from_slice(&[0x45, 0, 0, 28, 0, 1, 0, 0, 64, 17, 0, 0]);
        f.extend_from_slice(&[10, 0, 0, 1, 10, 0, 0, 2]);
        f.extend_from_slice(&sport.to_be_bytes());
        f.extend_from_slice(&dport.to_be_bytes());
        f.extend_from_slice(&[0, 8, 0, 0]);
        f
    }

    fn trace(frames: &[Vec<u8>]) -> Vec<u8> {
        let mut writer = TraceWriter::new(Vec::new(), None);
        for (i, f) in frames.iter().enumerate() {
            writer.write_packet(i as u64 * 1_000_000, f).unwrap();
        }
        writer.into_inner()
    }

    #[test]
    fn test_pump_filters_and_counts() {
        let registry = default_registry();
        let root = registry.lookup("ether").unwrap();
        let filter = Compiler::with_root(&registry, root)
            .compile("udp(port=53)")
            .unwrap();
        let input = trace(&[udp_frame(5000, 53), udp_frame(5000, 123), udp_frame(53, 9)]);

        let mut reader = TraceReader::new(Cursor::new(input));
        let mut sink = PacketSink::new(
            OutputMode::Text { single_line: true },
            &registry,
            root,
            None,
            None,
            Vec::new(),
        )
        .unwrap();

        let stats = pump(&mut reader, 2, &filter, &registry, &mut sink).unwrap();
        assert_eq!(stats, Stats { read: 3, matched: 2 });

        let PacketSink::Text(printer) = sink else {
            unreachable!()
        };
        let text = String::from_utf8(printer.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("000000 ms ether("));
        assert!(lines[1].starts_with("000002 ms ether("));
        assert!(lines[1].contains("udp(s=53 d=9"));
    }

    #[test]
    fn test_run_replays_trace_file() {
        let registry = default_registry();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&trace(&[udp_frame(1, 2), udp_frame(3, 4)]))
            .unwrap();
        file.flush().unwrap();

        let config = Config {
            source: crate::cli::Source::Trace(file.path().into()),
            root: None,
            filter: Some("udp(dport=4)".into()),
            output: OutputMode::Trace,
            max_capture: None,
            read_ahead: 32,
        };
        let mut out = Vec::new();
        let mut diag = Vec::new();
        let stats = run(&config, &registry, &mut out, &mut diag).unwrap();

        assert_eq!(stats, Stats { read: 2, matched: 1 });
        // Binary output suppresses the diagnostic line
        assert!(diag.is_empty());

        let mut replayed = TraceReader::new(Cursor::new(out));
        let pkt = replayed.next_packet().unwrap().unwrap();
        assert_eq!(pkt.timestamp_ns, 1_000_000);
        assert!(replayed.next_packet().unwrap().is_none());
    }

    #[test]
    fn test_run_reports_optimized_filter() {
        let registry = default_registry();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&trace(&[udp_frame(1, 2)])).unwrap();
        file.flush().unwrap();

        let config = Config {
            source: crate::cli::Source::Trace(file.path().into()),
            root: None,
            filter: Some("udp(port=53) || udp(port=123)".into()),
            output: OutputMode::Text { single_line: true },
            max_capture: None,
            read_ahead: 32,
        };
        let mut diag = Vec::new();
        run(&config, &registry, Vec::new(), &mut diag).unwrap();
        assert_eq!(
            String::from_utf8(diag).unwrap(),
            "after optimize: ether(ip(udp(port=53 || port=123)))\n"
        );
    }

    #[test]
    fn test_run_rejects_bad_filter() {
        let registry = default_registry();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&trace(&[udp_frame(1, 2)])).unwrap();
        file.flush().unwrap();

        let config = Config {
            source: crate::cli::Source::Trace(file.path().into()),
            root: None,
            filter: Some("udp(bogus=1)".into()),
            output: OutputMode::Text { single_line: true },
            max_capture: None,
            read_ahead: 32,
        };
        let err = run(&config, &registry, Vec::new(), Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "unknown udp field: bogus");
    }
}
