//! Error types for the snoopy binary.

use thiserror::Error;

/// Errors from setting up a capture.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// No interface qualifies as a default capture source
    #[error("no up, non-loopback interface with a link-layer address")]
    NoInterface,

    /// Named interface does not exist
    #[error("no such interface: {0}")]
    InterfaceNotFound(String),

    /// The interface does not deliver Ethernet frames
    #[error("unsupported channel type on {0}")]
    UnsupportedChannel(String),

    /// Trace replay was requested without a file
    #[error("trace replay (-t) needs a file")]
    MissingTraceFile,
}
