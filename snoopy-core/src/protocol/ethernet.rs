//! Ethernet II protocol.

use etherparse::Ethernet2HeaderSlice;

use super::{
    Comparison, FieldKind, FieldSpec, FieldValue, MatchContext, MuxEntry, Protocol, Test,
};
use crate::error::ProtocolError;
use crate::format::format_mac;

/// Ethernet II header length.
pub const ETHERNET_HEADER_LEN: usize = 14;

/// Well-known EtherType values (IEEE 802).
pub mod ethertype {
    pub const IPV4: u16 = 0x0800;
    pub const ARP: u16 = 0x0806;
    pub const RARP: u16 = 0x8035;
    pub const IPV6: u16 = 0x86DD;
}

const OP_SRC: u8 = 0;
const OP_DST: u8 = 1;
const OP_ADDR: u8 = 2;
const OP_TYPE: u8 = 3;

static FIELDS: [FieldSpec; 4] = [
    FieldSpec::new("src", FieldKind::Mac, OP_SRC, "source address"),
    FieldSpec::new("dst", FieldKind::Mac, OP_DST, "destination address"),
    FieldSpec::new("addr", FieldKind::Mac, OP_ADDR, "source or destination address"),
    FieldSpec::new("type", FieldKind::Num, OP_TYPE, "ethertype of the payload"),
];

static MUX: [MuxEntry; 4] = [
    MuxEntry::new(ethertype::IPV4 as u32, "ip"),
    MuxEntry::new(ethertype::ARP as u32, "arp"),
    MuxEntry::new(ethertype::RARP as u32, "rarp"),
    MuxEntry::new(ethertype::IPV6 as u32, "ip6"),
];

/// Ethernet II protocol.
#[derive(Debug, Clone, Copy)]
pub struct EthernetProtocol;

impl EthernetProtocol {
    fn header<'a>(ctx: &mut MatchContext<'a>) -> Result<Ethernet2HeaderSlice<'a>, ProtocolError> {
        let bytes = ctx.header("ether", ETHERNET_HEADER_LEN)?;
        Ethernet2HeaderSlice::from_slice(bytes).map_err(|_| ProtocolError::PacketTooShort {
            protocol: "ether",
            needed: ETHERNET_HEADER_LEN,
            have: bytes.len(),
        })
    }

    fn compare(eth: &Ethernet2HeaderSlice<'_>, cmp: &Comparison) -> bool {
        let src = FieldValue::Mac(eth.source());
        let dst = FieldValue::Mac(eth.destination());
        match cmp.op {
            OP_SRC => src == cmp.value,
            OP_DST => dst == cmp.value,
            OP_ADDR => src == cmp.value || dst == cmp.value,
            OP_TYPE => cmp.value == FieldValue::Num(eth.ether_type().0 as u64),
            _ => false,
        }
    }
}

impl Protocol for EthernetProtocol {
    fn name(&self) -> &'static str {
        "ether"
    }

    fn display_name(&self) -> &'static str {
        "Ethernet II"
    }

    fn fields(&self) -> &'static [FieldSpec] {
        &FIELDS
    }

    fn mux(&self) -> &'static [MuxEntry] {
        &MUX
    }

    fn format_mux_value(&self, value: u32) -> String {
        format!("{value:#06x}")
    }

    fn print(&self, ctx: &mut MatchContext<'_>, out: &mut String) -> Result<(), ProtocolError> {
        let len = ctx.data().len();
        let eth = Self::header(ctx)?;
        let ether_type = eth.ether_type().0;
        out.push_str(&format!(
            "s={} d={} pr={:04x} ln={}",
            format_mac(&eth.source()),
            format_mac(&eth.destination()),
            ether_type,
            len
        ));
        let next = ctx.demux(ether_type as u32, ether_type as u32);
        ctx.set_proto(Some(next));
        Ok(())
    }

    fn filter(&self, test: &Test<'_>, ctx: &mut MatchContext<'_>) -> bool {
        let Ok(eth) = Self::header(ctx) else {
            return false;
        };
        match test {
            Test::Next(target) => {
                let ether_type = eth.ether_type().0 as u32;
                ctx.demux(ether_type, ether_type) == *target
            }
            Test::Field(cmp) => Self::compare(&eth, cmp),
        }
    }
}
