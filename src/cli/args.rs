//! Command-line argument definitions.

use clap::Parser;
use std::path::PathBuf;

/// Filter and print network packets.
///
/// Filters name protocols and field values, e.g. `tcp(port=80) || udp(dns)`.
/// Missing outer layers are filled in from the root protocol.
#[derive(Parser, Debug)]
#[command(name = "snoopy")]
#[command(author, version, about, long_about = None)]
#[command(disable_help_flag = true)]
pub struct Args {
    /// Trace file (with -t), interface name, or byte stream to read
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Truncate captured packets to this many bytes (0 = no limit)
    #[arg(short = 'M', long = "max-capture", value_name = "N")]
    pub max_capture: Option<u32>,

    /// Packets to read ahead per batch
    #[arg(short = 'N', long = "read-ahead", value_name = "N", default_value_t = 32)]
    pub read_ahead: usize,

    /// Filter expression
    #[arg(short = 'f', long = "filter", value_name = "FILTER")]
    pub filter: Option<String>,

    /// Protocol of the first header in each packet
    #[arg(short = 'h', long = "proto", value_name = "PROTO")]
    pub proto: Option<String>,

    /// Replay a trace file instead of capturing
    #[arg(short = 't', long = "trace")]
    pub trace: bool,

    /// Write matching packets as trace records instead of text
    #[arg(short = 'd', long = "dump", conflicts_with = "pcap")]
    pub dump: bool,

    /// Write matching packets as a pcap stream instead of text
    #[arg(short = 'D', long = "pcap")]
    pub pcap: bool,

    /// Print each packet on a single line
    #[arg(short = 's', long = "single-line")]
    pub single_line: bool,

    /// List protocols, or the fields and subprotocols of PROTO
    #[arg(
        long = "list-protocols",
        value_name = "PROTO",
        num_args = 0..=1,
        default_missing_value = ""
    )]
    pub list_protocols: Option<String>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print help
    #[arg(long = "help", action = clap::ArgAction::Help)]
    help: Option<bool>,
}
