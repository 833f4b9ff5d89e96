//! Address and byte formatting.

use std::fmt::Write;

/// Format 6 bytes as a MAC address string in colon-separated hex format.
///
/// # Example
///
/// ```
/// use snoopy_core::format::format_mac;
///
/// assert_eq!(format_mac(&[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]), "aa:bb:cc:dd:ee:ff");
/// ```
pub fn format_mac(mac: &[u8; 6]) -> String {
    format!(
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    )
}

/// Format bytes as a contiguous lowercase hex string.
pub fn format_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// Append a hex dump of `bytes` to `out`, 16 bytes per line.
///
/// Lines after the first are prefixed with `indent` so the dump lines up
/// under the protocol name in multi-line output.
pub fn hexdump(out: &mut String, bytes: &[u8], indent: &str) {
    for (i, line) in bytes.chunks(16).enumerate() {
        if i > 0 {
            out.push('\n');
            out.push_str(indent);
        }
        for (j, b) in line.iter().enumerate() {
            if j > 0 {
                out.push(' ');
            }
            let _ = write!(out, "{b:02x}");
        }
    }
}
