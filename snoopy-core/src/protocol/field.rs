//! Field tables and typed field values.
//!
//! A protocol publishes the fields a filter may compare against as a static
//! table of [`FieldSpec`]s. The field compiler parses the literal written in
//! the filter text according to the field's [`FieldKind`], producing a
//! [`FieldValue`] the protocol's predicate can compare without re-parsing.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::format::{format_hex, format_mac};

/// How the literal on the right of `field=value` is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Decimal or `0x` prefixed hexadecimal integer
    Num,
    /// Link-layer (MAC) address
    Mac,
    /// IPv4 address in dotted-quad notation
    Ipv4,
    /// IPv6 address, textual or as 32 hex digits
    Ipv6,
    /// Exactly 16 bytes written as 32 hex digits
    Bytes,
}

/// One entry of a protocol's field table.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Name used in filter expressions
    pub name: &'static str,
    /// Literal syntax accepted for this field
    pub kind: FieldKind,
    /// Protocol-private operator code handed back to the predicate
    pub op: u8,
    /// One-line description shown by `--list-protocols <proto>`
    pub help: &'static str,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind, op: u8, help: &'static str) -> Self {
        Self {
            name,
            kind,
            op,
            help,
        }
    }
}

/// A parsed field literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    Num(u64),
    Mac([u8; 6]),
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    Bytes([u8; 16]),
}

impl FieldValue {
    /// Create a MAC address value from the first 6 bytes of a slice.
    pub fn mac(bytes: &[u8]) -> Option<Self> {
        let mac: [u8; 6] = bytes.get(..6)?.try_into().ok()?;
        Some(FieldValue::Mac(mac))
    }

    /// Create an IPv4 address value from the first 4 bytes of a slice.
    pub fn ipv4(bytes: &[u8]) -> Option<Self> {
        let octets: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
        Some(FieldValue::Ipv4(Ipv4Addr::from(octets)))
    }

    /// Try to get as u64.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::Num(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Num(v) => write!(f, "{v}"),
            FieldValue::Mac(mac) => f.write_str(&format_mac(mac)),
            FieldValue::Ipv4(addr) => write!(f, "{addr}"),
            FieldValue::Ipv6(addr) => write!(f, "{addr}"),
            FieldValue::Bytes(bytes) => f.write_str(&format_hex(bytes)),
        }
    }
}

impl FieldKind {
    /// Parse a filter literal as this kind. Returns `None` on malformed input.
    pub fn parse(self, text: &str) -> Option<FieldValue> {
        match self {
            FieldKind::Num => parse_num(text).map(FieldValue::Num),
            FieldKind::Mac => parse_mac(text).map(FieldValue::Mac),
            FieldKind::Ipv4 => text.parse().ok().map(FieldValue::Ipv4),
            FieldKind::Ipv6 => text
                .parse()
                .ok()
                .or_else(|| parse_byte_array(text).map(Ipv6Addr::from))
                .map(FieldValue::Ipv6),
            FieldKind::Bytes => parse_byte_array(text).map(FieldValue::Bytes),
        }
    }
}

fn parse_num(text: &str) -> Option<u64> {
    match text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

/// Accepts `aa:bb:cc:dd:ee:ff`, `aa-bb-cc-dd-ee-ff` or twelve bare hex digits.
fn parse_mac(text: &str) -> Option<[u8; 6]> {
    let digits: String = text.chars().filter(|c| *c != ':' && *c != '-').collect();
    if digits.len() == text.len() || text.split([':', '-']).all(|p| p.len() == 2) {
        hex_pairs::<6>(&digits)
    } else {
        None
    }
}

/// Parse exactly 16 hex-digit pairs. Odd or short runs and trailing input fail.
pub fn parse_byte_array(text: &str) -> Option<[u8; 16]> {
    hex_pairs::<16>(text)
}

fn hex_pairs<const N: usize>(text: &str) -> Option<[u8; N]> {
    let bytes = text.as_bytes();
    if bytes.len() != N * 2 {
        return None;
    }
    let mut out = [0u8; N];
    for (slot, pair) in out.iter_mut().zip(bytes.chunks_exact(2)) {
        let hi = (pair[0] as char).to_digit(16)?;
        let lo = (pair[1] as char).to_digit(16)?;
        *slot = (hi << 4 | lo) as u8;
    }
    Some(out)
}
