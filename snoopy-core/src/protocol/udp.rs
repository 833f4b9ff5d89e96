//! UDP protocol.

use etherparse::UdpHeaderSlice;

use super::{Comparison, FieldKind, FieldSpec, MatchContext, MuxEntry, Protocol, Test};
use crate::error::ProtocolError;

const UDP_HEADER_LEN: usize = 8;

const OP_SPORT: u8 = 0;
const OP_DPORT: u8 = 1;
const OP_PORT: u8 = 2;

static FIELDS: [FieldSpec; 3] = [
    FieldSpec::new("sport", FieldKind::Num, OP_SPORT, "source port"),
    FieldSpec::new("dport", FieldKind::Num, OP_DPORT, "destination port"),
    FieldSpec::new("port", FieldKind::Num, OP_PORT, "source or destination port"),
];

static MUX: [MuxEntry; 4] = [
    MuxEntry::new(53, "dns"),
    MuxEntry::new(67, "bootp"),
    MuxEntry::new(68, "bootp"),
    MuxEntry::new(123, "ntp"),
];

/// UDP protocol.
#[derive(Debug, Clone, Copy)]
pub struct UdpProtocol;

impl UdpProtocol {
    fn header<'a>(ctx: &mut MatchContext<'a>) -> Result<UdpHeaderSlice<'a>, ProtocolError> {
        let bytes = ctx.header("udp", UDP_HEADER_LEN)?;
        UdpHeaderSlice::from_slice(bytes).map_err(|e| ProtocolError::InvalidField {
            protocol: "udp",
            field: "header",
            reason: e.to_string(),
        })
    }

    fn compare(udp: &UdpHeaderSlice<'_>, cmp: &Comparison) -> bool {
        let Some(value) = cmp.value.as_u64() else {
            return false;
        };
        let sport = udp.source_port() as u64;
        let dport = udp.destination_port() as u64;
        match cmp.op {
            OP_SPORT => sport == value,
            OP_DPORT => dport == value,
            OP_PORT => sport == value || dport == value,
            _ => false,
        }
    }
}

impl Protocol for UdpProtocol {
    fn name(&self) -> &'static str {
        "udp"
    }

    fn display_name(&self) -> &'static str {
        "UDP"
    }

    fn fields(&self) -> &'static [FieldSpec] {
        &FIELDS
    }

    fn mux(&self) -> &'static [MuxEntry] {
        &MUX
    }

    fn print(&self, ctx: &mut MatchContext<'_>, out: &mut String) -> Result<(), ProtocolError> {
        let udp = Self::header(ctx)?;
        let (sport, dport) = (udp.source_port(), udp.destination_port());
        out.push_str(&format!("s={} d={} ln={}", sport, dport, udp.length()));
        let next = if ctx.is_empty() {
            None
        } else {
            Some(ctx.demux(sport as u32, dport as u32))
        };
        ctx.set_proto(next);
        Ok(())
    }

    fn filter(&self, test: &Test<'_>, ctx: &mut MatchContext<'_>) -> bool {
        let Ok(udp) = Self::header(ctx) else {
            return false;
        };
        match test {
            Test::Next(target) => {
                let (sport, dport) = (udp.source_port() as u32, udp.destination_port() as u32);
                ctx.demux(sport, dport) == *target
            }
            Test::Field(cmp) => Self::compare(&udp, cmp),
        }
    }
}
