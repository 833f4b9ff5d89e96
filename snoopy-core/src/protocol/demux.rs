//! Next-protocol selection from a mux table.

use super::{MuxEdge, ProtoId};

/// Return the target of the first edge whose value equals `val1` or `val2`.
///
/// Protocols that key on either of two header fields (TCP/UDP source and
/// destination ports) pass both; single-key protocols pass the same value
/// twice. Table order decides ties.
pub fn demux(edges: &[MuxEdge], val1: u32, val2: u32, default: ProtoId) -> ProtoId {
    edges
        .iter()
        .find(|edge| edge.value == val1 || edge.value == val2)
        .map(|edge| edge.target)
        .unwrap_or(default)
}
