//! Run configuration derived from the command line.

use std::path::PathBuf;

use super::Args;
use crate::error::CaptureError;

/// Where packets come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Recorded trace or pcap file
    Trace(PathBuf),
    /// Live capture, on the default interface when `None`
    Live(Option<String>),
    /// Raw byte stream cut into packets by the root protocol's framer
    Stream(PathBuf),
}

impl Source {
    pub fn is_live(&self) -> bool {
        !matches!(self, Source::Trace(_))
    }
}

/// How matching packets are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// One decoded line (or block) per packet
    Text { single_line: bool },
    /// Native trace records
    Trace,
    /// pcap stream
    Pcap,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub source: Source,
    /// Root protocol name; `None` lets the source decide
    pub root: Option<String>,
    pub filter: Option<String>,
    pub output: OutputMode,
    pub max_capture: Option<u32>,
    pub read_ahead: usize,
}

impl TryFrom<Args> for Config {
    type Error = CaptureError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let source = match (args.trace, args.path) {
            (true, Some(path)) => Source::Trace(path),
            (true, None) => return Err(CaptureError::MissingTraceFile),
            (false, None) => Source::Live(None),
            (false, Some(path)) if path.exists() => Source::Stream(path),
            (false, Some(path)) => Source::Live(Some(path.to_string_lossy().into_owned())),
        };

        let output = if args.pcap {
            OutputMode::Pcap
        } else if args.dump {
            OutputMode::Trace
        } else {
            OutputMode::Text {
                single_line: args.single_line,
            }
        };

        Ok(Config {
            source,
            root: args.proto,
            filter: args.filter,
            output,
            max_capture: args.max_capture.filter(|&m| m > 0),
            read_ahead: args.read_ahead.max(1),
        })
    }
}
