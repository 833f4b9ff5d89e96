//! IPv4 protocol.

use etherparse::Ipv4HeaderSlice;

use super::{
    Comparison, FieldKind, FieldSpec, FieldValue, MatchContext, MuxEntry, Protocol, Test,
};
use crate::error::ProtocolError;

/// IP protocol numbers shared by IPv4 and IPv6 mux tables.
pub mod ip_proto {
    pub const ICMP: u8 = 1;
    pub const IPIP: u8 = 4;
    pub const TCP: u8 = 6;
    pub const UDP: u8 = 17;
    pub const IPV6: u8 = 41;
    pub const GRE: u8 = 47;
    pub const ICMPV6: u8 = 58;
}

const OP_SRC: u8 = 0;
const OP_DST: u8 = 1;
const OP_ADDR: u8 = 2;
const OP_PROTO: u8 = 3;
const OP_TTL: u8 = 4;

static FIELDS: [FieldSpec; 5] = [
    FieldSpec::new("src", FieldKind::Ipv4, OP_SRC, "source address"),
    FieldSpec::new("dst", FieldKind::Ipv4, OP_DST, "destination address"),
    FieldSpec::new("addr", FieldKind::Ipv4, OP_ADDR, "source or destination address"),
    FieldSpec::new("proto", FieldKind::Num, OP_PROTO, "protocol number of the payload"),
    FieldSpec::new("ttl", FieldKind::Num, OP_TTL, "time to live"),
];

static MUX: [MuxEntry; 6] = [
    MuxEntry::new(ip_proto::ICMP as u32, "icmp"),
    MuxEntry::new(ip_proto::IPIP as u32, "ip"),
    MuxEntry::new(ip_proto::TCP as u32, "tcp"),
    MuxEntry::new(ip_proto::UDP as u32, "udp"),
    MuxEntry::new(ip_proto::IPV6 as u32, "ip6"),
    MuxEntry::new(ip_proto::GRE as u32, "gre"),
];

/// IPv4 protocol.
#[derive(Debug, Clone, Copy)]
pub struct Ipv4Protocol;

impl Ipv4Protocol {
    /// Decode the header, consume it and trim the cursor to the datagram's
    /// total length.
    fn header<'a>(ctx: &mut MatchContext<'a>) -> Result<Ipv4HeaderSlice<'a>, ProtocolError> {
        let ip = Ipv4HeaderSlice::from_slice(ctx.data()).map_err(|e| {
            ProtocolError::InvalidField {
                protocol: "ip",
                field: "header",
                reason: e.to_string(),
            }
        })?;
        let header_len = ip.slice().len();
        let payload_len = (ip.total_len() as usize).saturating_sub(header_len);
        ctx.header("ip", header_len)?;
        ctx.truncate(payload_len);
        Ok(ip)
    }

    fn compare(ip: &Ipv4HeaderSlice<'_>, cmp: &Comparison) -> bool {
        let src = FieldValue::Ipv4(ip.source_addr());
        let dst = FieldValue::Ipv4(ip.destination_addr());
        match cmp.op {
            OP_SRC => src == cmp.value,
            OP_DST => dst == cmp.value,
            OP_ADDR => src == cmp.value || dst == cmp.value,
            OP_PROTO => cmp.value == FieldValue::Num(ip.protocol().0 as u64),
            OP_TTL => cmp.value == FieldValue::Num(ip.ttl() as u64),
            _ => false,
        }
    }
}

impl Protocol for Ipv4Protocol {
    fn name(&self) -> &'static str {
        "ip"
    }

    fn display_name(&self) -> &'static str {
        "IPv4"
    }

    fn fields(&self) -> &'static [FieldSpec] {
        &FIELDS
    }

    fn mux(&self) -> &'static [MuxEntry] {
        &MUX
    }

    fn print(&self, ctx: &mut MatchContext<'_>, out: &mut String) -> Result<(), ProtocolError> {
        let ip = Self::header(ctx)?;
        let proto = ip.protocol().0;
        out.push_str(&format!(
            "s={} d={} id={:04x} ttl={} pr={} ln={} hl={}",
            ip.source_addr(),
            ip.destination_addr(),
            ip.identification(),
            ip.ttl(),
            proto,
            ip.total_len(),
            ip.slice().len()
        ));
        let next = ctx.demux(proto as u32, proto as u32);
        ctx.set_proto(Some(next));
        Ok(())
    }

    fn filter(&self, test: &Test<'_>, ctx: &mut MatchContext<'_>) -> bool {
        let Ok(ip) = Self::header(ctx) else {
            return false;
        };
        match test {
            Test::Next(target) => {
                let proto = ip.protocol().0 as u32;
                ctx.demux(proto, proto) == *target
            }
            Test::Field(cmp) => Self::compare(&ip, cmp),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::protocol::default_registry;
    use crate::protocol::test_utils::Ipv4Builder;

    #[test]
    fn test_print_ipv4() {
        let registry = default_registry();
        let ip = registry.lookup("ip").unwrap();
        let packet = Ipv4Builder::new()
            .src_ip([10, 0, 0, 1])
            .dst_ip([10, 0, 0, 2])
            .protocol(ip_proto::UDP)
            .payload(vec![0; 8])
            .build();
        let mut ctx = MatchContext::new(&registry, ip, &packet);
        let mut out = String::new();

        Ipv4Protocol.print(&mut ctx, &mut out).unwrap();

        assert_eq!(
            out,
            "s=10.0.0.1 d=10.0.0.2 id=0001 ttl=64 pr=17 ln=28 hl=20"
        );
        assert_eq!(ctx.proto(), registry.lookup("udp"));
        assert_eq!(ctx.data().len(), 8);
    }

    #[test]
    fn test_trailing_padding_trimmed() {
        let registry = default_registry();
        let ip = registry.lookup("ip").unwrap();
        let mut packet = Ipv4Builder::new().payload(vec![1, 2, 3, 4]).build();
        packet.extend_from_slice(&[0; 6]); // Ethernet minimum-frame padding
        let mut ctx = MatchContext::new(&registry, ip, &packet);

        assert!(Ipv4Protocol.filter(&Test::Next(registry.lookup("tcp").unwrap()), &mut ctx));
        assert_eq!(ctx.data(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_filter_addr_matches_either() {
        let registry = default_registry();
        let ip = registry.lookup("ip").unwrap();
        let packet = Ipv4Builder::new()
            .src_ip([192, 168, 0, 1])
            .dst_ip([192, 168, 0, 2])
            .build();
        let check = |op, value| {
            let cmp = Comparison {
                field: "x",
                op,
                value,
            };
            let mut ctx = MatchContext::new(&registry, ip, &packet);
            Ipv4Protocol.filter(&Test::Field(&cmp), &mut ctx)
        };

        let b = FieldValue::Ipv4(Ipv4Addr::new(192, 168, 0, 2));
        assert!(check(OP_ADDR, b));
        assert!(check(OP_DST, b));
        assert!(!check(OP_SRC, b));
        assert!(check(OP_TTL, FieldValue::Num(64)));
        assert!(check(OP_PROTO, FieldValue::Num(6)));
    }

    #[test]
    fn test_garbage_rejected() {
        let registry = default_registry();
        let ip = registry.lookup("ip").unwrap();
        let packet = [0x60u8; 20]; // version 6
        let mut ctx = MatchContext::new(&registry, ip, &packet);
        let mut out = String::new();

        assert!(Ipv4Protocol.print(&mut ctx, &mut out).is_err());
    }
}
