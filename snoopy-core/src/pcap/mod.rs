//! Classic pcap capture files.
//!
//! - [`PcapReader`] - replay a capture file through `pcap_parser`
//! - [`PcapWriter`] - write filtered packets as a nanosecond pcap stream

mod reader;
mod writer;

pub use reader::{PcapFormat, PcapReader};
pub use writer::{PcapWriter, FAKE_ETHERNET_HEADER, PCAP_NANO_MAGIC};

use crate::error::PcapError;

pub const LINKTYPE_ETHERNET: u32 = 1;
pub const LINKTYPE_RAW: u32 = 101;
pub const LINKTYPE_IPV4: u32 = 228;
pub const LINKTYPE_IPV6: u32 = 229;

/// Root protocol name for packets of a pcap link type.
pub fn root_for_link_type(link_type: u32) -> Result<&'static str, PcapError> {
    match link_type {
        LINKTYPE_ETHERNET => Ok("ether"),
        LINKTYPE_RAW | LINKTYPE_IPV4 => Ok("ip"),
        LINKTYPE_IPV6 => Ok("ip6"),
        _ => Err(PcapError::UnsupportedLinkType { link_type }),
    }
}
