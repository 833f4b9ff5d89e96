//! ARP protocol (Ethernet/IPv4 form).

use std::net::Ipv4Addr;

use super::{Comparison, FieldKind, FieldSpec, FieldValue, MatchContext, Protocol, Test};
use crate::error::ProtocolError;
use crate::format::format_mac;

/// ARP for Ethernet/IPv4 is 28 bytes.
const ARP_LEN: usize = 28;

/// ARP operation codes.
pub mod operation {
    pub const REQUEST: u16 = 1;
    pub const REPLY: u16 = 2;
}

const OP_OP: u8 = 0;
const OP_SPA: u8 = 1;
const OP_TPA: u8 = 2;
const OP_SHA: u8 = 3;
const OP_THA: u8 = 4;

static FIELDS: [FieldSpec; 5] = [
    FieldSpec::new("op", FieldKind::Num, OP_OP, "operation (1 request, 2 reply)"),
    FieldSpec::new("spa", FieldKind::Ipv4, OP_SPA, "sender protocol address"),
    FieldSpec::new("tpa", FieldKind::Ipv4, OP_TPA, "target protocol address"),
    FieldSpec::new("sha", FieldKind::Mac, OP_SHA, "sender hardware address"),
    FieldSpec::new("tha", FieldKind::Mac, OP_THA, "target hardware address"),
];

struct ArpHeader<'a>(&'a [u8]);

impl ArpHeader<'_> {
    fn operation(&self) -> u16 {
        u16::from_be_bytes([self.0[6], self.0[7]])
    }

    fn sha(&self) -> [u8; 6] {
        [self.0[8], self.0[9], self.0[10], self.0[11], self.0[12], self.0[13]]
    }

    fn spa(&self) -> Ipv4Addr {
        Ipv4Addr::new(self.0[14], self.0[15], self.0[16], self.0[17])
    }

    fn tha(&self) -> [u8; 6] {
        [self.0[18], self.0[19], self.0[20], self.0[21], self.0[22], self.0[23]]
    }

    fn tpa(&self) -> Ipv4Addr {
        Ipv4Addr::new(self.0[24], self.0[25], self.0[26], self.0[27])
    }
}

/// ARP protocol.
#[derive(Debug, Clone, Copy)]
pub struct ArpProtocol;

impl ArpProtocol {
    fn compare(arp: &ArpHeader<'_>, cmp: &Comparison) -> bool {
        let value = match cmp.op {
            OP_OP => FieldValue::Num(arp.operation() as u64),
            OP_SPA => FieldValue::Ipv4(arp.spa()),
            OP_TPA => FieldValue::Ipv4(arp.tpa()),
            OP_SHA => FieldValue::Mac(arp.sha()),
            OP_THA => FieldValue::Mac(arp.tha()),
            _ => return false,
        };
        value == cmp.value
    }
}

impl Protocol for ArpProtocol {
    fn name(&self) -> &'static str {
        "arp"
    }

    fn display_name(&self) -> &'static str {
        "ARP"
    }

    fn fields(&self) -> &'static [FieldSpec] {
        &FIELDS
    }

    fn print(&self, ctx: &mut MatchContext<'_>, out: &mut String) -> Result<(), ProtocolError> {
        let arp = ArpHeader(ctx.header("arp", ARP_LEN)?);
        let op = match arp.operation() {
            operation::REQUEST => "request",
            operation::REPLY => "reply",
            _ => "unknown",
        };
        out.push_str(&format!(
            "op={} spa={} sha={} tpa={} tha={}",
            op,
            arp.spa(),
            format_mac(&arp.sha()),
            arp.tpa(),
            format_mac(&arp.tha())
        ));
        ctx.set_proto(None);
        Ok(())
    }

    fn filter(&self, test: &Test<'_>, ctx: &mut MatchContext<'_>) -> bool {
        let Ok(bytes) = ctx.header("arp", ARP_LEN) else {
            return false;
        };
        match test {
            // Nothing rides on ARP
            Test::Next(_) => false,
            Test::Field(cmp) => Self::compare(&ArpHeader(bytes), cmp),
        }
    }
}
