//! Hex dump protocol and opaque placeholders.
//!
//! `dump` is what the demultiplexer falls back to when no mux entry matches.
//! Names that appear in a mux table without a registered decoder are given
//! the same behaviour under their own name.

use super::{MatchContext, Protocol};
use crate::error::ProtocolError;
use crate::format::hexdump;

/// A protocol that prints whatever bytes remain and ends the chain.
#[derive(Debug, Clone, Copy)]
pub struct Opaque {
    name: &'static str,
    display_name: &'static str,
}

impl Opaque {
    /// The built-in `dump` protocol.
    pub fn dump() -> Self {
        Self {
            name: "dump",
            display_name: "Hex dump",
        }
    }

    /// Stand-in for a protocol named in a mux table but never registered.
    pub fn placeholder(name: &'static str) -> Self {
        Self {
            name,
            display_name: name,
        }
    }
}

impl Protocol for Opaque {
    fn name(&self) -> &'static str {
        self.name
    }

    fn display_name(&self) -> &'static str {
        self.display_name
    }

    fn print(&self, ctx: &mut MatchContext<'_>, out: &mut String) -> Result<(), ProtocolError> {
        hexdump(out, ctx.rest(), "\t\t");
        ctx.set_proto(None);
        Ok(())
    }
}
