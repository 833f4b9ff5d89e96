//! ICMP protocol.

use super::{Comparison, FieldKind, FieldSpec, MatchContext, Protocol, Test};
use crate::error::ProtocolError;

const ICMP_HEADER_LEN: usize = 8;

/// ICMP message types.
pub mod icmp_type {
    pub const ECHO_REPLY: u8 = 0;
    pub const DEST_UNREACHABLE: u8 = 3;
    pub const ECHO_REQUEST: u8 = 8;
    pub const TIME_EXCEEDED: u8 = 11;
}

const OP_TYPE: u8 = 0;
const OP_CODE: u8 = 1;

static FIELDS: [FieldSpec; 2] = [
    FieldSpec::new("type", FieldKind::Num, OP_TYPE, "message type"),
    FieldSpec::new("code", FieldKind::Num, OP_CODE, "message code"),
];

/// ICMP protocol.
#[derive(Debug, Clone, Copy)]
pub struct IcmpProtocol;

impl IcmpProtocol {
    fn type_name(icmp_type: u8) -> &'static str {
        match icmp_type {
            icmp_type::ECHO_REPLY => "echo-reply",
            icmp_type::DEST_UNREACHABLE => "unreachable",
            icmp_type::ECHO_REQUEST => "echo-request",
            icmp_type::TIME_EXCEEDED => "time-exceeded",
            _ => "other",
        }
    }

    fn compare(header: &[u8], cmp: &Comparison) -> bool {
        let actual = match cmp.op {
            OP_TYPE => header[0],
            OP_CODE => header[1],
            _ => return false,
        };
        cmp.value.as_u64() == Some(actual as u64)
    }
}

impl Protocol for IcmpProtocol {
    fn name(&self) -> &'static str {
        "icmp"
    }

    fn display_name(&self) -> &'static str {
        "ICMP"
    }

    fn fields(&self) -> &'static [FieldSpec] {
        &FIELDS
    }

    fn print(&self, ctx: &mut MatchContext<'_>, out: &mut String) -> Result<(), ProtocolError> {
        let header = ctx.header("icmp", ICMP_HEADER_LEN)?;
        let checksum = u16::from_be_bytes([header[2], header[3]]);
        out.push_str(&format!(
            "t={}({}) c={} ck={:04x}",
            header[0],
            Self::type_name(header[0]),
            header[1],
            checksum
        ));
        // Whatever follows (echo data, quoted datagram) is dumped
        let next = if ctx.is_empty() {
            None
        } else {
            Some(ctx.registry().dump())
        };
        ctx.set_proto(next);
        Ok(())
    }

    fn filter(&self, test: &Test<'_>, ctx: &mut MatchContext<'_>) -> bool {
        let Ok(header) = ctx.header("icmp", ICMP_HEADER_LEN) else {
            return false;
        };
        match test {
            Test::Next(target) => *target == ctx.registry().dump(),
            Test::Field(cmp) => Self::compare(header, cmp),
        }
    }
}
