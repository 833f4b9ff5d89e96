//! Protocol graph, filter compiler and packet matcher behind the `snoopy`
//! packet analyzer.
//!
//! Protocols register a name, a table of filterable fields and a mux table
//! naming the subprotocols they carry. The [`ProtocolRegistry`] resolves
//! those tables into a graph, and a [`Compiler`] uses the graph to turn an
//! expression such as `tcp(port=80) || udp(dns)` into a tree rooted at the
//! capture's outermost protocol, filling in the layers it implies.
//!
//! ```rust
//! use snoopy_core::prelude::*;
//!
//! let registry = default_registry();
//! let filter = Compiler::new(&registry, "ether")
//!     .unwrap()
//!     .compile("ip(tcp(port=22))")
//!     .unwrap();
//! assert_eq!(filter.to_string(), "ether(ip(tcp(port=22)))");
//!
//! // A runt frame never decodes far enough to match
//! assert!(!filter.matches(&registry, &[0u8; 10]).unwrap());
//! ```
//!
//! Packet sources live in [`io`] (trace records, framed streams) and
//! [`pcap`] (classic capture files, which can also be written).

pub mod error;
pub mod filter;
pub mod format;
pub mod io;
pub mod pcap;
pub mod prelude;
pub mod protocol;

pub use error::{Error, FilterError, PcapError, ProtocolError, Result};
pub use filter::{CompiledFilter, Compiler, Filter};
pub use io::{open_replay, PacketReader, RawPacket, Replay};
pub use protocol::{
    default_registry, print_packet, FieldValue, MatchContext, ProtoId, Protocol, ProtocolRegistry,
};
