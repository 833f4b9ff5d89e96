//! Error types for snoopy-core.
//!
//! - [`enum@Error`] - Main error enum that wraps all error types
//! - [`FilterError`] - Errors from parsing and compiling filter expressions
//! - [`PcapError`] - Errors from reading or writing capture files
//! - [`ProtocolError`] - Errors from decoding protocol headers
//!
//! All errors implement `std::error::Error` and can be converted to `anyhow::Error`.

use thiserror::Error;

/// Main error type for snoopy-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Error compiling or evaluating a filter
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// Error reading or writing a capture file
    #[error("PCAP error: {0}")]
    Pcap(#[from] PcapError),

    /// Error during protocol decoding
    #[error("Protocol decode error: {0}")]
    Protocol(#[from] ProtocolError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while turning a filter expression into a compiled tree.
///
/// Every variant is fatal: no partially compiled filter is ever returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// Syntax error in the expression text
    #[error("filter parse error: {message}")]
    Parse { message: String },

    /// Expression text was empty
    #[error("empty filter expression")]
    EmptyFilter,

    /// The root protocol name does not resolve
    #[error("unknown protocol: {0}")]
    UnknownRoot(String),

    /// No path of bounded length leads from the root to the protocol
    #[error("can't get to {0}")]
    Unreachable(String),

    /// Field comparison with no enclosing protocol reference
    #[error("field {field} outside of any protocol")]
    FieldOutsideProtocol { field: String },

    /// Field is not in the protocol's field table, or the table is empty
    #[error("unknown {protocol} field: {field}")]
    UnknownField { protocol: String, field: String },

    /// Nested protocol is not on a mux edge of its parent
    #[error("unknown {parent} subprotocol: {child}")]
    UnknownSubprotocol { parent: String, child: String },

    /// Field value does not parse as the field's kind
    #[error("bad {protocol} {field} value: {value}")]
    BadValue {
        protocol: String,
        field: String,
        value: String,
    },

    /// Top-level protocol references that are not the root
    #[error("bogus filter: bad top-level protocol: {}", .names.join(", "))]
    BadTopLevel { names: Vec<String> },

    /// The tree reached a stage carrying a node the stage cannot handle
    #[error("internal filter error: {0}")]
    Internal(&'static str),
}

impl FilterError {
    /// Create a parse error with a message.
    pub fn parse_error(message: impl Into<String>) -> Self {
        FilterError::Parse {
            message: message.into(),
        }
    }
}

/// Errors related to capture file reading and writing.
#[derive(Error, Debug)]
pub enum PcapError {
    /// Invalid capture format
    #[error("Invalid PCAP format: {reason}")]
    InvalidFormat { reason: String },

    /// Unsupported link type
    #[error("Unsupported link type: {link_type}")]
    UnsupportedLinkType { link_type: u32 },
}

/// Errors related to protocol decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Packet too short for protocol header
    #[error("{protocol}: packet too short (need {needed} bytes, have {have})")]
    PacketTooShort {
        protocol: &'static str,
        needed: usize,
        have: usize,
    },

    /// Invalid header field value
    #[error("{protocol}: invalid {field}: {reason}")]
    InvalidField {
        protocol: &'static str,
        field: &'static str,
        reason: String,
    },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
