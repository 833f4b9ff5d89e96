//! Filter expression compiler and matcher.
//!
//! A filter expression names protocols and field values:
//!
//! ```text
//! tcp(port=80) || udp(dns)
//! ip(src=10.0.0.1 && ttl=64)
//! !arp
//! ```
//!
//! Compilation runs once, before any packet is read:
//!
//! 1. [`parse_filter`] turns text into a [`Filter`] tree
//! 2. [`complete`] binds protocol names and inserts the implied outer layers
//! 3. [`optimize`] merges shared protocol prefixes until nothing changes
//! 4. [`compile_fields`] types every `field=value` against its protocol
//! 5. [`validate`] checks that the top level only tests the root protocol
//!
//! The resulting [`CompiledFilter`] is read-only and evaluated per packet.
//!
//! ## Example
//!
//! ```rust
//! use snoopy_core::filter::Compiler;
//! use snoopy_core::protocol::default_registry;
//!
//! let registry = default_registry();
//! let compiler = Compiler::new(&registry, "ether").unwrap();
//! let filter = compiler.compile("tcp(port=80) || tcp(port=443)").unwrap();
//!
//! assert_eq!(
//!     filter.to_string(),
//!     "ether(ip(tcp(port=80 || port=443)))"
//! );
//! ```

mod ast;
mod compile;
mod complete;
mod matcher;
mod optimize;
mod parser;
mod validate;

use std::fmt;

use tracing::debug;

pub use ast::{FieldCmp, Filter, ProtoRef};
pub use compile::{compile_cmp, compile_fields};
pub use complete::complete;
pub use matcher::{eval, matches};
pub use optimize::{optimize, optimize_pass};
pub use parser::parse_filter;
pub use validate::validate;

use crate::error::FilterError;
use crate::protocol::{MatchContext, ProtoId, ProtocolRegistry};

/// Compilation context: the protocol graph and the capture root.
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'r> {
    registry: &'r ProtocolRegistry,
    root: ProtoId,
}

impl<'r> Compiler<'r> {
    /// Create a compiler for packets that start with the protocol `root`.
    pub fn new(registry: &'r ProtocolRegistry, root: &str) -> Result<Self, FilterError> {
        let root = registry
            .lookup(root)
            .ok_or_else(|| FilterError::UnknownRoot(root.to_string()))?;
        Ok(Self::with_root(registry, root))
    }

    pub fn with_root(registry: &'r ProtocolRegistry, root: ProtoId) -> Self {
        Self { registry, root }
    }

    pub fn root(&self) -> ProtoId {
        self.root
    }

    /// Parse and compile an expression.
    pub fn compile(&self, text: &str) -> Result<CompiledFilter, FilterError> {
        self.compile_tree(parse_filter(text)?)
    }

    /// Compile an already parsed tree.
    pub fn compile_tree(&self, filter: Filter) -> Result<CompiledFilter, FilterError> {
        let filter = complete(self.registry, self.root, filter)?;
        debug!(filter = %filter, "after complete");

        let filter = optimize(filter);
        debug!(filter = %filter, "after optimize");

        let filter = compile_fields(self.registry, filter)?;
        validate(&filter, self.root)?;

        Ok(CompiledFilter {
            tree: Some(filter),
            root: self.root,
        })
    }

    /// A filter that accepts every packet.
    pub fn accept_all(&self) -> CompiledFilter {
        CompiledFilter {
            tree: None,
            root: self.root,
        }
    }
}

/// A validated, fully typed filter tree bound to a root protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFilter {
    tree: Option<Filter>,
    root: ProtoId,
}

impl CompiledFilter {
    pub fn tree(&self) -> Option<&Filter> {
        self.tree.as_ref()
    }

    pub fn root(&self) -> ProtoId {
        self.root
    }

    /// Whether `packet`, decoded from the root protocol, passes the filter.
    pub fn matches(&self, registry: &ProtocolRegistry, packet: &[u8]) -> Result<bool, FilterError> {
        matches(
            self.tree.as_ref(),
            MatchContext::new(registry, self.root, packet),
        )
    }
}

impl fmt::Display for CompiledFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tree {
            Some(tree) => tree.fmt(f),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::default_registry;
    use crate::protocol::test_utils::*;

    #[test]
    fn test_unknown_root() {
        let registry = default_registry();
        let err = Compiler::new(&registry, "token-ring").unwrap_err();
        assert_eq!(err.to_string(), "unknown protocol: token-ring");
    }

    #[test]
    fn test_top_level_unknown_is_bogus() {
        let registry = default_registry();
        let compiler = Compiler::new(&registry, "ether").unwrap();
        let err = compiler.compile("bogus || tcp").unwrap_err();
        assert_eq!(
            err,
            FilterError::BadTopLevel {
                names: vec!["bogus".into()]
            }
        );
    }

    #[test]
    fn test_alternate_root() {
        let registry = default_registry();
        let compiler = Compiler::new(&registry, "ip").unwrap();
        let filter = compiler.compile("tcp(dport=22)").unwrap();
        assert_eq!(filter.to_string(), "ip(tcp(dport=22))");

        let tcp = TcpBuilder::new().dst_port(22).build();
        let packet = Ipv4Builder::new().tcp().payload(tcp).build();
        assert!(filter.matches(&registry, &packet).unwrap());

        // An ether frame decoded as ip fails
        assert!(!filter.matches(&registry, &tcp_frame(1, 22)).unwrap());
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        let registry = default_registry();
        let compiler = Compiler::new(&registry, "ether").unwrap();
        let err = compiler
            .compile(&("!".repeat(10_000) + "ether"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "filter parse error: filter nested deeper than 256 levels"
        );

        // Just under the limit still compiles and evaluates
        let filter = compiler.compile(&("!!".repeat(100) + "tcp")).unwrap();
        assert!(filter.matches(&registry, &tcp_frame(1, 2)).unwrap());
    }

    #[test]
    fn test_accept_all() {
        let registry = default_registry();
        let compiler = Compiler::new(&registry, "ether").unwrap();
        let filter = compiler.accept_all();
        assert!(filter.matches(&registry, &[]).unwrap());
        assert_eq!(filter.to_string(), "");
    }

    #[test]
    fn test_compile_is_reusable() {
        let registry = default_registry();
        let compiler = Compiler::new(&registry, "ether").unwrap();
        let filter = compiler.compile("udp(port=53)").unwrap();
        let hits = [udp_frame(5000, 53), udp_frame(53, 5000), udp_frame(1, 2)]
            .iter()
            .filter(|p| filter.matches(&registry, p).unwrap())
            .count();
        assert_eq!(hits, 2);
    }
}
