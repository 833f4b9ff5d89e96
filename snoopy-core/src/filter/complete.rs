//! Tree completion.
//!
//! A filter may name a protocol deep in the header chain without spelling
//! out the layers in front of it: `tcp(port=80)` really means
//! `ether(ip(tcp(port=80)))` when capturing Ethernet. Completion walks the
//! tree, binds every protocol reference it can resolve and wraps it in the
//! intermediate protocol references the protocol graph requires, so the
//! matcher can descend one header per node.

use tracing::warn;

use super::ast::{Filter, ProtoRef};
use crate::error::FilterError;
use crate::protocol::{ProtoId, ProtocolRegistry};

/// Bind and complete every protocol reference in `filter`.
pub fn complete(
    registry: &ProtocolRegistry,
    root: ProtoId,
    filter: Filter,
) -> Result<Filter, FilterError> {
    complete_node(registry, root, filter, None)
}

fn complete_node(
    registry: &ProtocolRegistry,
    root: ProtoId,
    filter: Filter,
    last: Option<ProtoId>,
) -> Result<Filter, FilterError> {
    Ok(match filter {
        Filter::Not(inner) => Filter::not(complete_node(registry, root, *inner, last)?),
        Filter::And(l, r) => Filter::and(
            complete_node(registry, root, *l, last)?,
            complete_node(registry, root, *r, last)?,
        ),
        Filter::Or(l, r) => Filter::or(
            complete_node(registry, root, *l, last)?,
            complete_node(registry, root, *r, last)?,
        ),
        Filter::Proto(p) => complete_proto(registry, root, p, last)?,
        leaf @ (Filter::Field(_) | Filter::Compare(_)) => leaf,
    })
}

fn complete_proto(
    registry: &ProtocolRegistry,
    root: ProtoId,
    mut p: ProtoRef,
    last: Option<ProtoId>,
) -> Result<Filter, FilterError> {
    let Some(id) = registry.lookup(&p.name) else {
        if p.child.take().is_some() {
            warn!("{} unknown proto, ignoring params", p.name);
        }
        p.proto = None;
        return Ok(Filter::Proto(p));
    };

    p.proto = Some(id);
    if let Some(child) = p.child.take() {
        p.child = Some(Box::new(complete_node(registry, root, *child, Some(id))?));
    }
    let node = Filter::Proto(p);

    match last {
        None if id == root => Ok(node),
        // The outermost reference must be the root: search from it and add it
        None => {
            let inner = fill_in(registry, root, id, node)?;
            Ok(bound(registry, root, inner))
        }
        Some(parent) => fill_in(registry, parent, id, node),
    }
}

/// Wrap `node` (bound to `target`) in one reference per protocol strictly
/// between `from` and `target`.
fn fill_in(
    registry: &ProtocolRegistry,
    from: ProtoId,
    target: ProtoId,
    node: Filter,
) -> Result<Filter, FilterError> {
    if registry.has_edge(from, target) {
        return Ok(node);
    }
    let path = registry
        .find_path(from, target)
        .ok_or_else(|| FilterError::Unreachable(registry.name(target).to_string()))?;

    Ok(path
        .iter()
        .rev()
        .fold(node, |inner, &hop| bound(registry, hop, inner)))
}

fn bound(registry: &ProtocolRegistry, id: ProtoId, child: Filter) -> Filter {
    Filter::Proto(ProtoRef {
        name: registry.name(id).to_string(),
        proto: Some(id),
        child: Some(Box::new(child)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::parse_filter;
    use crate::protocol::default_registry;

    fn completed(text: &str) -> Result<Filter, FilterError> {
        let registry = default_registry();
        let root = registry.lookup("ether").unwrap();
        complete(&registry, root, parse_filter(text).unwrap())
    }

    #[test]
    fn test_root_reference_unchanged() {
        assert_eq!(completed("ether").unwrap().to_string(), "ether");
    }

    #[test]
    fn test_top_level_wrapped_in_root() {
        let f = completed("tcp(port=80)").unwrap();
        assert_eq!(f.to_string(), "ether(ip(tcp(port=80)))");
    }

    #[test]
    fn test_nested_gap_filled() {
        let f = completed("ether(udp)").unwrap();
        assert_eq!(f.to_string(), "ether(ip(udp))");

        // Direct successor needs nothing
        let f = completed("ip(tcp)").unwrap();
        assert_eq!(f.to_string(), "ether(ip(tcp))");
    }

    #[test]
    fn test_binds_every_reference() {
        let registry = default_registry();
        let root = registry.lookup("ether").unwrap();
        let f = complete(&registry, root, parse_filter("http").unwrap()).unwrap();

        let mut node = &f;
        let mut names = Vec::new();
        while let Filter::Proto(p) = node {
            assert_eq!(p.proto, registry.lookup(&p.name));
            names.push(p.name.as_str());
            match &p.child {
                Some(child) => node = child.as_ref(),
                None => break,
            }
        }
        assert_eq!(names, ["ether", "ip", "tcp", "http"]);
    }

    #[test]
    fn test_ip_in_ip_self_edge() {
        let f = completed("ip(ip(tcp))").unwrap();
        assert_eq!(f.to_string(), "ether(ip(ip(tcp)))");
    }

    #[test]
    fn test_boolean_structure_completed_per_branch() {
        let f = completed("tcp || arp").unwrap();
        assert_eq!(f.to_string(), "ether(ip(tcp)) || ether(arp)");
    }

    #[test]
    fn test_unknown_protocol_drops_params() {
        let f = completed("bogus(port=80)").unwrap();
        assert_eq!(f, Filter::proto("bogus"));

        // Nested unknown stays unbound under its parent
        let f = completed("ip(bogus)").unwrap();
        assert_eq!(f.to_string(), "ether(ip(bogus))");
    }

    #[test]
    fn test_self_reference_needs_self_edge() {
        // Neither tcp nor ether muxes to itself
        let err = completed("tcp(tcp)").unwrap_err();
        assert_eq!(err, FilterError::Unreachable("tcp".into()));
        let err = completed("ether(ether)").unwrap_err();
        assert_eq!(err, FilterError::Unreachable("ether".into()));
    }

    #[test]
    fn test_unreachable_is_fatal() {
        // Nothing leads from tcp back to arp
        let err = completed("tcp(arp)").unwrap_err();
        assert_eq!(err, FilterError::Unreachable("arp".into()));
    }
}
