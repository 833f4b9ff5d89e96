//! Formatting helpers shared by protocol printers and the filter printer.

mod address;

pub use address::{format_hex, format_mac, hexdump};
