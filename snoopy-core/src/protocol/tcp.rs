//! TCP protocol.

use etherparse::TcpHeaderSlice;

use super::{Comparison, FieldKind, FieldSpec, MatchContext, MuxEntry, Protocol, Test};
use crate::error::ProtocolError;

/// TCP flag bits as they appear in header byte 13.
pub mod flags {
    pub const FIN: u8 = 0x01;
    pub const SYN: u8 = 0x02;
    pub const RST: u8 = 0x04;
    pub const PSH: u8 = 0x08;
    pub const ACK: u8 = 0x10;
    pub const URG: u8 = 0x20;
}

const OP_SPORT: u8 = 0;
const OP_DPORT: u8 = 1;
const OP_PORT: u8 = 2;
const OP_FLAGS: u8 = 3;

static FIELDS: [FieldSpec; 4] = [
    FieldSpec::new("sport", FieldKind::Num, OP_SPORT, "source port"),
    FieldSpec::new("dport", FieldKind::Num, OP_DPORT, "destination port"),
    FieldSpec::new("port", FieldKind::Num, OP_PORT, "source or destination port"),
    FieldSpec::new("flags", FieldKind::Num, OP_FLAGS, "flag byte (fin=1 syn=2 rst=4 ack=16)"),
];

static MUX: [MuxEntry; 4] = [
    MuxEntry::new(22, "ssh"),
    MuxEntry::new(53, "dns"),
    MuxEntry::new(80, "http"),
    MuxEntry::new(443, "https"),
];

/// TCP protocol.
#[derive(Debug, Clone, Copy)]
pub struct TcpProtocol;

impl TcpProtocol {
    fn header<'a>(ctx: &mut MatchContext<'a>) -> Result<TcpHeaderSlice<'a>, ProtocolError> {
        let tcp = TcpHeaderSlice::from_slice(ctx.data()).map_err(|e| {
            ProtocolError::InvalidField {
                protocol: "tcp",
                field: "header",
                reason: e.to_string(),
            }
        })?;
        ctx.header("tcp", tcp.slice().len())?;
        Ok(tcp)
    }

    fn flag_byte(tcp: &TcpHeaderSlice<'_>) -> u8 {
        tcp.slice()[13]
    }

    fn compare(tcp: &TcpHeaderSlice<'_>, cmp: &Comparison) -> bool {
        let Some(value) = cmp.value.as_u64() else {
            return false;
        };
        let sport = tcp.source_port() as u64;
        let dport = tcp.destination_port() as u64;
        match cmp.op {
            OP_SPORT => sport == value,
            OP_DPORT => dport == value,
            OP_PORT => sport == value || dport == value,
            OP_FLAGS => Self::flag_byte(tcp) as u64 == value,
            _ => false,
        }
    }
}

impl Protocol for TcpProtocol {
    fn name(&self) -> &'static str {
        "tcp"
    }

    fn display_name(&self) -> &'static str {
        "TCP"
    }

    fn fields(&self) -> &'static [FieldSpec] {
        &FIELDS
    }

    fn mux(&self) -> &'static [MuxEntry] {
        &MUX
    }

    fn print(&self, ctx: &mut MatchContext<'_>, out: &mut String) -> Result<(), ProtocolError> {
        let tcp = Self::header(ctx)?;
        let (sport, dport) = (tcp.source_port(), tcp.destination_port());
        out.push_str(&format!(
            "s={} d={} seq={} ack={} fl={:02x} win={}",
            sport,
            dport,
            tcp.sequence_number(),
            tcp.acknowledgment_number(),
            Self::flag_byte(&tcp),
            tcp.window_size()
        ));
        let next = if ctx.is_empty() {
            None
        } else {
            Some(ctx.demux(sport as u32, dport as u32))
        };
        ctx.set_proto(next);
        Ok(())
    }

    fn filter(&self, test: &Test<'_>, ctx: &mut MatchContext<'_>) -> bool {
        let Ok(tcp) = Self::header(ctx) else {
            return false;
        };
        match test {
            Test::Next(target) => {
                let (sport, dport) = (tcp.source_port() as u32, tcp.destination_port() as u32);
                ctx.demux(sport, dport) == *target
            }
            Test::Field(cmp) => Self::compare(&tcp, cmp),
        }
    }
}
