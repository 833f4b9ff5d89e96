//! IPv6 protocol.

use etherparse::Ipv6HeaderSlice;

use super::ipv4::ip_proto;
use super::{
    Comparison, FieldKind, FieldSpec, FieldValue, MatchContext, MuxEntry, Protocol, Test,
};
use crate::error::ProtocolError;

const IPV6_HEADER_LEN: usize = 40;

const OP_SRC: u8 = 0;
const OP_DST: u8 = 1;
const OP_ADDR: u8 = 2;
const OP_NEXT: u8 = 3;
const OP_HLIM: u8 = 4;

static FIELDS: [FieldSpec; 5] = [
    FieldSpec::new("src", FieldKind::Ipv6, OP_SRC, "source address"),
    FieldSpec::new("dst", FieldKind::Ipv6, OP_DST, "destination address"),
    FieldSpec::new("addr", FieldKind::Ipv6, OP_ADDR, "source or destination address"),
    FieldSpec::new("next", FieldKind::Num, OP_NEXT, "next header"),
    FieldSpec::new("hlim", FieldKind::Num, OP_HLIM, "hop limit"),
];

static MUX: [MuxEntry; 5] = [
    MuxEntry::new(ip_proto::IPIP as u32, "ip"),
    MuxEntry::new(ip_proto::TCP as u32, "tcp"),
    MuxEntry::new(ip_proto::UDP as u32, "udp"),
    MuxEntry::new(ip_proto::IPV6 as u32, "ip6"),
    MuxEntry::new(ip_proto::ICMPV6 as u32, "icmp6"),
];

/// IPv6 protocol.
///
/// Extension headers are not walked; the fixed header's next-header value
/// selects the successor.
#[derive(Debug, Clone, Copy)]
pub struct Ipv6Protocol;

impl Ipv6Protocol {
    fn header<'a>(ctx: &mut MatchContext<'a>) -> Result<Ipv6HeaderSlice<'a>, ProtocolError> {
        let bytes = ctx.peek("ip6", IPV6_HEADER_LEN)?;
        let ip6 = Ipv6HeaderSlice::from_slice(bytes).map_err(|e| ProtocolError::InvalidField {
            protocol: "ip6",
            field: "header",
            reason: e.to_string(),
        })?;
        ctx.header("ip6", IPV6_HEADER_LEN)?;
        ctx.truncate(ip6.payload_length() as usize);
        Ok(ip6)
    }

    fn compare(ip6: &Ipv6HeaderSlice<'_>, cmp: &Comparison) -> bool {
        let src = FieldValue::Ipv6(ip6.source_addr());
        let dst = FieldValue::Ipv6(ip6.destination_addr());
        match cmp.op {
            OP_SRC => src == cmp.value,
            OP_DST => dst == cmp.value,
            OP_ADDR => src == cmp.value || dst == cmp.value,
            OP_NEXT => cmp.value == FieldValue::Num(ip6.next_header().0 as u64),
            OP_HLIM => cmp.value == FieldValue::Num(ip6.hop_limit() as u64),
            _ => false,
        }
    }
}

impl Protocol for Ipv6Protocol {
    fn name(&self) -> &'static str {
        "ip6"
    }

    fn display_name(&self) -> &'static str {
        "IPv6"
    }

    fn fields(&self) -> &'static [FieldSpec] {
        &FIELDS
    }

    fn mux(&self) -> &'static [MuxEntry] {
        &MUX
    }

    fn print(&self, ctx: &mut MatchContext<'_>, out: &mut String) -> Result<(), ProtocolError> {
        let ip6 = Self::header(ctx)?;
        let next = ip6.next_header().0;
        out.push_str(&format!(
            "s={} d={} hlim={} nh={} ln={}",
            ip6.source_addr(),
            ip6.destination_addr(),
            ip6.hop_limit(),
            next,
            ip6.payload_length()
        ));
        let successor = ctx.demux(next as u32, next as u32);
        ctx.set_proto(Some(successor));
        Ok(())
    }

    fn filter(&self, test: &Test<'_>, ctx: &mut MatchContext<'_>) -> bool {
        let Ok(ip6) = Self::header(ctx) else {
            return false;
        };
        match test {
            Test::Next(target) => {
                let next = ip6.next_header().0 as u32;
                ctx.demux(next, next) == *target
            }
            Test::Field(cmp) => Self::compare(&ip6, cmp),
        }
    }
}
