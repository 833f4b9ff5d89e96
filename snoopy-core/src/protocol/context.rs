//! Per-packet cursor shared by the printer, the matcher and protocol plugins.

use super::{demux, ProtoId, ProtocolRegistry};
use crate::error::ProtocolError;

/// Transient state for walking one packet's header chain.
///
/// The context is cheap to copy: the matcher snapshots it before evaluating
/// the left side of `&&`/`||` so a protocol predicate advancing the cursor on
/// one branch never moves it for the other.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    registry: &'a ProtocolRegistry,
    /// Bytes not yet consumed by a header decoder
    data: &'a [u8],
    /// Protocol expected at `data`, `None` once the chain ends
    proto: Option<ProtoId>,
    /// Set until the first protocol reference has been checked against the root
    need_root: bool,
}

impl<'a> MatchContext<'a> {
    /// Create a context positioned at the start of `data`, decoded as `root`.
    pub fn new(registry: &'a ProtocolRegistry, root: ProtoId, data: &'a [u8]) -> Self {
        Self {
            registry,
            data,
            proto: Some(root),
            need_root: true,
        }
    }

    pub fn registry(&self) -> &'a ProtocolRegistry {
        self.registry
    }

    /// Remaining undecoded bytes.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Protocol the cursor is currently positioned on.
    pub fn proto(&self) -> Option<ProtoId> {
        self.proto
    }

    pub fn set_proto(&mut self, proto: Option<ProtoId>) {
        self.proto = proto;
    }

    /// Whether the next protocol reference must be checked against the root.
    pub fn need_root(&self) -> bool {
        self.need_root
    }

    pub(crate) fn clear_need_root(&mut self) {
        self.need_root = false;
    }

    /// Borrow the first `len` bytes without consuming them.
    pub fn peek(&self, protocol: &'static str, len: usize) -> Result<&'a [u8], ProtocolError> {
        self.data.get(..len).ok_or(ProtocolError::PacketTooShort {
            protocol,
            needed: len,
            have: self.data.len(),
        })
    }

    /// Consume `len` bytes of header, returning them.
    pub fn header(&mut self, protocol: &'static str, len: usize) -> Result<&'a [u8], ProtocolError> {
        let hdr = self.peek(protocol, len)?;
        self.data = &self.data[len..];
        Ok(hdr)
    }

    /// Drop trailing bytes beyond `len`, e.g. link-layer padding after an
    /// IP datagram.
    pub fn truncate(&mut self, len: usize) {
        if len < self.data.len() {
            self.data = &self.data[..len];
        }
    }

    /// Consume everything that is left.
    pub fn rest(&mut self) -> &'a [u8] {
        std::mem::take(&mut self.data)
    }

    /// Pick the successor of the current protocol from its mux edges.
    ///
    /// Falls back to the registry's `dump` protocol when neither value matches.
    pub fn demux(&self, val1: u32, val2: u32) -> ProtoId {
        let default = self.registry.dump();
        match self.proto {
            Some(current) => demux(self.registry.edges(current), val1, val2, default),
            None => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::default_registry;

    #[test]
    fn test_header_advances_cursor() {
        let registry = default_registry();
        let root = registry.lookup("ether").unwrap();
        let data = [1u8, 2, 3, 4, 5];
        let mut ctx = MatchContext::new(&registry, root, &data);

        assert_eq!(ctx.header("test", 2).unwrap(), &[1, 2]);
        assert_eq!(ctx.data(), &[3, 4, 5]);

        let err = ctx.header("test", 4).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::PacketTooShort {
                protocol: "test",
                needed: 4,
                have: 3
            }
        );
        // A failed read leaves the cursor alone
        assert_eq!(ctx.data().len(), 3);
    }

    #[test]
    fn test_copy_is_independent() {
        let registry = default_registry();
        let root = registry.lookup("ether").unwrap();
        let data = [0u8; 8];
        let mut ctx = MatchContext::new(&registry, root, &data);
        let mut snapshot = ctx;

        snapshot.header("test", 6).unwrap();
        snapshot.clear_need_root();
        assert_eq!(ctx.data().len(), 8);
        assert!(ctx.need_root());
        ctx.clear_need_root();
        assert!(!ctx.need_root());
    }
}
