//! Convenient re-exports for common usage.
//!
//! ```rust
//! use snoopy_core::prelude::*;
//!
//! let registry = default_registry();
//! assert!(registry.lookup("tcp").is_some());
//! ```

// Protocol types
pub use crate::protocol::{
    default_registry, print_packet, FieldKind, FieldSpec, FieldValue, MatchContext, MuxEntry,
    ProtoId, Protocol, ProtocolRegistry, Test,
};

// Filter types
pub use crate::filter::{CompiledFilter, Compiler, Filter};

// I/O types
pub use crate::io::{PacketReader, RawPacket};

// Error types
pub use crate::error::{Error, FilterError, Result};
