//! Packet builders and a stub protocol for tests.
//!
//! Each builder keeps its header as a fixed byte template and patches
//! fields in place; length fields are filled in by `build`.

use super::{FieldSpec, MatchContext, MuxEntry, Protocol};
use crate::error::ProtocolError;

/// Protocol with a fixed name, mux table and field table and no decoding.
///
/// Its predicate is the trait default, so every test it is asked passes.
#[derive(Debug, Clone, Copy)]
pub struct StubProtocol {
    name: &'static str,
    mux: &'static [MuxEntry],
    fields: &'static [FieldSpec],
}

impl StubProtocol {
    pub fn new(name: &'static str, mux: &'static [MuxEntry]) -> Self {
        Self {
            name,
            mux,
            fields: &[],
        }
    }

    pub fn with_fields(mut self, fields: &'static [FieldSpec]) -> Self {
        self.fields = fields;
        self
    }
}

impl Protocol for StubProtocol {
    fn name(&self) -> &'static str {
        self.name
    }

    fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    fn mux(&self) -> &'static [MuxEntry] {
        self.mux
    }

    fn print(&self, ctx: &mut MatchContext<'_>, _out: &mut String) -> Result<(), ProtocolError> {
        ctx.set_proto(None);
        Ok(())
    }
}

fn put_u16(buf: &mut [u8], at: usize, v: u16) {
    buf[at..at + 2].copy_from_slice(&v.to_be_bytes());
}

fn concat(header: &[u8], payload: Vec<u8>) -> Vec<u8> {
    let mut out = header.to_vec();
    out.extend(payload);
    out
}

const ETHER_TEMPLATE: [u8; 14] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // dst
    0x00, 0x11, 0x22, 0x33, 0x44, 0x55, // src
    0x08, 0x00,
];

/// Ethernet II frame. Broadcast destination, IPv4 ethertype by default.
#[derive(Debug, Clone)]
pub struct EthernetBuilder {
    hdr: [u8; 14],
    body: Vec<u8>,
}

impl Default for EthernetBuilder {
    fn default() -> Self {
        Self {
            hdr: ETHER_TEMPLATE,
            body: Vec::new(),
        }
    }
}

impl EthernetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dst_mac(mut self, mac: [u8; 6]) -> Self {
        self.hdr[0..6].copy_from_slice(&mac);
        self
    }

    pub fn src_mac(mut self, mac: [u8; 6]) -> Self {
        self.hdr[6..12].copy_from_slice(&mac);
        self
    }

    pub fn ethertype(mut self, ethertype: u16) -> Self {
        put_u16(&mut self.hdr, 12, ethertype);
        self
    }

    pub fn ipv4(self) -> Self {
        self.ethertype(0x0800)
    }

    pub fn ipv6(self) -> Self {
        self.ethertype(0x86dd)
    }

    pub fn arp(self) -> Self {
        self.ethertype(0x0806)
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.body = payload;
        self
    }

    pub fn build(self) -> Vec<u8> {
        concat(&self.hdr, self.body)
    }
}

// v4/ihl 5, id 1, ttl 64, tcp, 192.168.1.1 -> 192.168.1.2; checksum left zero
const IPV4_TEMPLATE: [u8; 20] = [
    0x45, 0, 0, 0, 0, 1, 0, 0, 64, 6, 0, 0, 192, 168, 1, 1, 192, 168, 1, 2,
];

/// IPv4 header without options.
#[derive(Debug, Clone)]
pub struct Ipv4Builder {
    hdr: [u8; 20],
    body: Vec<u8>,
}

impl Default for Ipv4Builder {
    fn default() -> Self {
        Self {
            hdr: IPV4_TEMPLATE,
            body: Vec::new(),
        }
    }
}

impl Ipv4Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl(mut self, ttl: u8) -> Self {
        self.hdr[8] = ttl;
        self
    }

    pub fn protocol(mut self, protocol: u8) -> Self {
        self.hdr[9] = protocol;
        self
    }

    pub fn tcp(self) -> Self {
        self.protocol(6)
    }

    pub fn udp(self) -> Self {
        self.protocol(17)
    }

    pub fn src_ip(mut self, ip: [u8; 4]) -> Self {
        self.hdr[12..16].copy_from_slice(&ip);
        self
    }

    pub fn dst_ip(mut self, ip: [u8; 4]) -> Self {
        self.hdr[16..20].copy_from_slice(&ip);
        self
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.body = payload;
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        let total = (self.hdr.len() + self.body.len()) as u16;
        put_u16(&mut self.hdr, 2, total);
        concat(&self.hdr, self.body)
    }
}

// sport 12345, dport 80, seq 1, offset 5, SYN, window 65535
const TCP_TEMPLATE: [u8; 20] = [
    0x30, 0x39, 0, 80, 0, 0, 0, 1, 0, 0, 0, 0, 0x50, 0x02, 0xff, 0xff, 0, 0, 0, 0,
];

/// TCP header without options.
#[derive(Debug, Clone)]
pub struct TcpBuilder {
    hdr: [u8; 20],
    body: Vec<u8>,
}

impl Default for TcpBuilder {
    fn default() -> Self {
        Self {
            hdr: TCP_TEMPLATE,
            body: Vec::new(),
        }
    }
}

impl TcpBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn src_port(mut self, port: u16) -> Self {
        put_u16(&mut self.hdr, 0, port);
        self
    }

    pub fn dst_port(mut self, port: u16) -> Self {
        put_u16(&mut self.hdr, 2, port);
        self
    }

    pub fn flags(mut self, flags: u8) -> Self {
        self.hdr[13] = flags;
        self
    }

    pub fn syn(self) -> Self {
        self.flags(0x02)
    }

    pub fn syn_ack(self) -> Self {
        self.flags(0x12)
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.body = payload;
        self
    }

    pub fn build(self) -> Vec<u8> {
        concat(&self.hdr, self.body)
    }
}

/// UDP header, 12345 -> 53 by default.
#[derive(Debug, Clone)]
pub struct UdpBuilder {
    hdr: [u8; 8],
    body: Vec<u8>,
}

impl Default for UdpBuilder {
    fn default() -> Self {
        Self {
            hdr: [0x30, 0x39, 0, 53, 0, 0, 0, 0],
            body: Vec::new(),
        }
    }
}

impl UdpBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn src_port(mut self, port: u16) -> Self {
        put_u16(&mut self.hdr, 0, port);
        self
    }

    pub fn dst_port(mut self, port: u16) -> Self {
        put_u16(&mut self.hdr, 2, port);
        self
    }

    pub fn dns(self) -> Self {
        self.dst_port(53)
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.body = payload;
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        let len = (self.hdr.len() + self.body.len()) as u16;
        put_u16(&mut self.hdr, 4, len);
        concat(&self.hdr, self.body)
    }
}

/// ICMP message; an echo request with id 1 and sequence 1 by default.
#[derive(Debug, Clone)]
pub struct IcmpBuilder {
    hdr: [u8; 8],
    body: Vec<u8>,
}

impl Default for IcmpBuilder {
    fn default() -> Self {
        Self {
            hdr: [8, 0, 0, 0, 0, 1, 0, 1],
            body: Vec::new(),
        }
    }
}

impl IcmpBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn kind(mut self, icmp_type: u8, code: u8) -> Self {
        self.hdr[0] = icmp_type;
        self.hdr[1] = code;
        self
    }

    pub fn echo_request(self) -> Self {
        self.kind(8, 0)
    }

    pub fn destination_unreachable(self, code: u8) -> Self {
        self.kind(3, code)
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.body = payload;
        self
    }

    pub fn build(self) -> Vec<u8> {
        concat(&self.hdr, self.body)
    }
}

/// Ethernet/IPv4/TCP frame with the given ports.
pub fn tcp_frame(src_port: u16, dst_port: u16) -> Vec<u8> {
    let segment = TcpBuilder::new().src_port(src_port).dst_port(dst_port).build();
    EthernetBuilder::new()
        .payload(Ipv4Builder::new().tcp().payload(segment).build())
        .build()
}

/// Ethernet/IPv4/UDP frame with the given ports.
pub fn udp_frame(src_port: u16, dst_port: u16) -> Vec<u8> {
    let datagram = UdpBuilder::new().src_port(src_port).dst_port(dst_port).build();
    EthernetBuilder::new()
        .payload(Ipv4Builder::new().udp().payload(datagram).build())
        .build()
}
