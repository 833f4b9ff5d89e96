//! Protocol decoding framework.
//!
//! This module provides:
//! - [`Protocol`] trait for implementing decoders
//! - [`ProtocolRegistry`] holding decoders and the mux graph between them
//! - [`MatchContext`], the cursor protocols decode from
//! - Built-in decoders for common protocols
//!
//! ## Built-in Protocols
//!
//! | Layer | Protocols |
//! |-------|-----------|
//! | Link | Ethernet (`ether`) |
//! | Network | IPv4 (`ip`), IPv6 (`ip6`), ARP, ICMP |
//! | Transport | TCP, UDP |
//!
//! Names referenced from a mux table without a decoder (`gre`, `dns`,
//! `http`, ...) are registered as opaque placeholders when the graph is built.
//!
//! ## Example
//!
//! ```rust
//! use snoopy_core::protocol::{default_registry, print_packet};
//!
//! let registry = default_registry();
//! let root = registry.lookup("ether").unwrap();
//! let frame: &[u8] = &[
//!     0xff, 0xff, 0xff, 0xff, 0xff, 0xff,  // dst mac
//!     0x00, 0x00, 0x00, 0x00, 0x00, 0x00,  // src mac
//!     0x88, 0xcc,                          // ethertype (LLDP, not decoded)
//!     0x02, 0x07,
//! ];
//!
//! let mut out = String::new();
//! print_packet(&registry, root, frame, true, &mut out);
//! assert!(out.starts_with("ether(s=00:00:00:00:00:00"));
//! assert!(out.ends_with("dump(02 07)"));
//! ```

mod context;
mod demux;
mod field;
mod registry;

// Protocol implementations
mod arp;
mod dump;
mod ethernet;
mod icmp;
mod ipv4;
mod ipv6;
mod tcp;
mod udp;

// Test utilities (only compiled for tests)
#[cfg(test)]
pub mod test_utils;

pub use context::MatchContext;
pub use demux::demux;
pub use field::{parse_byte_array, FieldKind, FieldSpec, FieldValue};
pub use registry::{
    Comparison, MuxEdge, MuxEntry, ProtoId, Protocol, ProtocolRegistry, Test, MAX_HOPS,
};

// Re-export protocol implementations
pub use arp::ArpProtocol;
pub use dump::Opaque;
pub use ethernet::{EthernetProtocol, ETHERNET_HEADER_LEN};
pub use icmp::IcmpProtocol;
pub use ipv4::Ipv4Protocol;
pub use ipv6::Ipv6Protocol;
pub use tcp::TcpProtocol;
pub use udp::UdpProtocol;

// Re-export protocol constants
pub use arp::operation as arp_operation;
pub use ethernet::ethertype;
pub use icmp::icmp_type;
pub use ipv4::ip_proto;
pub use tcp::flags as tcp_flags;

/// Create a registry with all built-in protocols and a built graph.
pub fn default_registry() -> ProtocolRegistry {
    let mut registry = ProtocolRegistry::new();

    // Layer 2
    registry.register(EthernetProtocol);
    registry.register(ArpProtocol);

    // Layer 3
    registry.register(Ipv4Protocol);
    registry.register(Ipv6Protocol);

    // Layer 4
    registry.register(TcpProtocol);
    registry.register(UdpProtocol);
    registry.register(IcmpProtocol);

    registry.build_graph();
    registry
}

/// Decode a packet header by header, starting at `root`, appending
/// `name(fields)` for each layer to `out`.
///
/// Each layer starts on a new indented line unless `single_line` is set.
/// A header that fails to decode prints `TOO SHORT` and ends the walk.
pub fn print_packet(
    registry: &ProtocolRegistry,
    root: ProtoId,
    data: &[u8],
    single_line: bool,
    out: &mut String,
) {
    let mut ctx = MatchContext::new(registry, root, data);

    while let Some(id) = ctx.proto() {
        if !single_line {
            out.push_str("\n\t");
        }
        out.push_str(registry.name(id));
        out.push('(');
        let before = ctx.data().len();
        if registry.get(id).print(&mut ctx, out).is_err() {
            out.push_str("TOO SHORT");
            ctx.rest();
        }
        out.push(')');
        if ctx.is_empty() {
            break;
        }
        // A decoder that neither consumed nor moved on would spin forever
        if ctx.data().len() == before && ctx.proto() == Some(id) {
            break;
        }
    }
}
