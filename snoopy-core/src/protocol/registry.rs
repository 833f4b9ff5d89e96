//! Protocol registry and the protocol graph.
//!
//! Protocols are registered once at startup. [`ProtocolRegistry::build_graph`]
//! then resolves every mux table entry to a protocol id, synthesizing an
//! opaque placeholder for names nothing decodes. The resulting graph is
//! directed and may contain cycles (IP muxes back to IP for IP-in-IP), so
//! every walk over it is bounded.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::io::{self, Read};

use smallvec::SmallVec;
use tracing::debug;

use super::{FieldSpec, FieldValue, MatchContext, Opaque};
use crate::error::ProtocolError;

/// Longest protocol path the completer will search for.
pub const MAX_HOPS: usize = 20;

/// Index of a protocol inside its [`ProtocolRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProtoId(pub(crate) usize);

impl ProtoId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A mux table entry as declared by a protocol: discriminant to successor name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuxEntry {
    pub value: u32,
    pub name: &'static str,
}

impl MuxEntry {
    pub const fn new(value: u32, name: &'static str) -> Self {
        Self { value, name }
    }
}

/// A mux table entry after graph construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuxEdge {
    pub value: u32,
    pub target: ProtoId,
}

/// A compiled `field=value` test, owned by the protocol whose table declared
/// the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub field: &'static str,
    /// Operator code from the field table
    pub op: u8,
    pub value: FieldValue,
}

/// What the matcher asks a protocol predicate.
#[derive(Debug, Clone, Copy)]
pub enum Test<'f> {
    /// Decode this header and report whether the next header is the given protocol.
    Next(ProtoId),
    /// Report whether this header satisfies the comparison.
    Field(&'f Comparison),
}

/// Core trait all protocol decoders implement.
pub trait Protocol: Send + Sync + fmt::Debug {
    /// Unique identifier used in filter expressions (e.g., "tcp", "ether").
    fn name(&self) -> &'static str;

    /// Human-readable display name.
    fn display_name(&self) -> &'static str {
        self.name()
    }

    /// Fields a filter may compare against.
    fn fields(&self) -> &'static [FieldSpec] {
        &[]
    }

    /// Ordered table of discriminant values and the protocols they select.
    fn mux(&self) -> &'static [MuxEntry] {
        &[]
    }

    /// Render a mux discriminant the way this protocol writes it.
    fn format_mux_value(&self, value: u32) -> String {
        value.to_string()
    }

    /// Print this header's fields into `out`, consume the header from
    /// `ctx` and set the context's protocol to whatever follows.
    fn print(&self, ctx: &mut MatchContext<'_>, out: &mut String) -> Result<(), ProtocolError>;

    /// Protocol-specific predicate used by the runtime matcher.
    ///
    /// A protocol without a predicate accepts every test.
    fn filter(&self, _test: &Test<'_>, _ctx: &mut MatchContext<'_>) -> bool {
        true
    }

    /// Read the next packet from a byte stream into `buf`, returning its
    /// length. Zero means end of stream.
    fn frame(&self, src: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
        src.read(buf)
    }
}

/// Registry of protocols plus the resolved mux graph between them.
#[derive(Debug)]
pub struct ProtocolRegistry {
    protocols: Vec<Box<dyn Protocol>>,
    by_name: HashMap<&'static str, ProtoId>,
    edges: Vec<Vec<MuxEdge>>,
    dump: ProtoId,
}

impl ProtocolRegistry {
    /// Create a registry holding only the `dump` protocol.
    pub fn new() -> Self {
        let mut registry = Self {
            protocols: Vec::new(),
            by_name: HashMap::new(),
            edges: Vec::new(),
            dump: ProtoId(0),
        };
        registry.dump = registry.register(Opaque::dump());
        registry
    }

    /// Register a protocol, returning its id.
    ///
    /// Registering a name twice replaces the earlier decoder but keeps its id.
    pub fn register<P: Protocol + 'static>(&mut self, protocol: P) -> ProtoId {
        let name = protocol.name();
        if let Some(&id) = self.by_name.get(name) {
            debug!(protocol = name, "replacing registered protocol");
            self.protocols[id.0] = Box::new(protocol);
            return id;
        }
        let id = ProtoId(self.protocols.len());
        self.protocols.push(Box::new(protocol));
        self.by_name.insert(name, id);
        id
    }

    /// Resolve every mux table into graph edges.
    ///
    /// Unknown target names get an opaque placeholder protocol. Running the
    /// build again yields the same nodes and edges.
    pub fn build_graph(&mut self) {
        let mut edges = Vec::with_capacity(self.protocols.len());
        let mut i = 0;
        // Placeholders appended during the walk have empty mux tables
        while i < self.protocols.len() {
            let mux = self.protocols[i].mux();
            let mut resolved = Vec::with_capacity(mux.len());
            for entry in mux {
                let target = match self.by_name.get(entry.name) {
                    Some(&id) => id,
                    None => {
                        debug!(protocol = entry.name, "adding placeholder protocol");
                        self.register(Opaque::placeholder(entry.name))
                    }
                };
                resolved.push(MuxEdge {
                    value: entry.value,
                    target,
                });
            }
            edges.push(resolved);
            i += 1;
        }
        self.edges = edges;
    }

    /// Look up a protocol id by name.
    pub fn lookup(&self, name: &str) -> Option<ProtoId> {
        self.by_name.get(name).copied()
    }

    /// Get a protocol by id.
    pub fn get(&self, id: ProtoId) -> &dyn Protocol {
        self.protocols[id.0].as_ref()
    }

    /// Get a protocol by name.
    pub fn get_by_name(&self, name: &str) -> Option<&dyn Protocol> {
        self.lookup(name).map(|id| self.get(id))
    }

    pub fn name(&self, id: ProtoId) -> &'static str {
        self.protocols[id.0].name()
    }

    /// Resolved mux edges leaving `id`. Empty before the graph is built.
    pub fn edges(&self, id: ProtoId) -> &[MuxEdge] {
        self.edges.get(id.0).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `to` is a direct successor of `from`.
    pub fn has_edge(&self, from: ProtoId, to: ProtoId) -> bool {
        self.edges(from).iter().any(|edge| edge.target == to)
    }

    /// The hex-dump protocol, used as the demux default.
    pub fn dump(&self) -> ProtoId {
        self.dump
    }

    /// Find the protocols strictly between `from` and `to` on a shortest
    /// path of at most [`MAX_HOPS`] edges.
    ///
    /// Edges are explored in mux table order, so among equally short paths the
    /// one using earlier table entries wins. A direct edge yields an empty
    /// path. `None` means `to` is unreachable within the bound.
    pub fn find_path(&self, from: ProtoId, to: ProtoId) -> Option<SmallVec<[ProtoId; 4]>> {
        let mut parent: Vec<Option<ProtoId>> = vec![None; self.protocols.len()];
        let mut seen = vec![false; self.protocols.len()];
        let mut queue = VecDeque::new();
        seen[from.0] = true;
        queue.push_back((from, 1usize));

        while let Some((node, hops)) = queue.pop_front() {
            for edge in self.edges(node) {
                if edge.target == to {
                    let mut path = SmallVec::new();
                    let mut cur = node;
                    while cur != from {
                        path.push(cur);
                        cur = parent[cur.0]?;
                    }
                    path.reverse();
                    return Some(path);
                }
                if !seen[edge.target.0] && hops < MAX_HOPS {
                    seen[edge.target.0] = true;
                    parent[edge.target.0] = Some(node);
                    queue.push_back((edge.target, hops + 1));
                }
            }
        }
        None
    }

    /// Iterate over all registered protocols in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (ProtoId, &dyn Protocol)> {
        self.protocols
            .iter()
            .enumerate()
            .map(|(i, p)| (ProtoId(i), p.as_ref()))
    }

    /// Number of registered protocols.
    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }
}

impl Default for ProtocolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
