//! snoopy - filter and print network packets.
//!
//! The binary wires [`snoopy_core`]'s filter compiler to packet sources
//! (live capture, trace replay, framed streams) and output sinks (text,
//! trace records, pcap).
//!
//! # Example
//!
//! ```no_run
//! use snoopy::cli::{Config, OutputMode, Source};
//! use snoopy_core::default_registry;
//!
//! let config = Config {
//!     source: Source::Trace("capture.pcap".into()),
//!     root: None,
//!     filter: Some("tcp(port=22)".into()),
//!     output: OutputMode::Text { single_line: true },
//!     max_capture: None,
//!     read_ahead: 32,
//! };
//! let registry = default_registry();
//! let stats = snoopy::run(&config, &registry, std::io::stdout(), std::io::stderr())?;
//! println!("{} of {} packets matched", stats.matched, stats.read);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod capture;
pub mod cli;
pub mod error;
pub mod output;
mod run;

pub use error::CaptureError;
pub use run::{pump, run, Stats};
