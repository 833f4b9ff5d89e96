//! Field compilation: raw `field=value` nodes become typed comparisons.

use super::ast::{FieldCmp, Filter, ProtoRef};
use crate::error::FilterError;
use crate::protocol::{Comparison, ProtoId, ProtocolRegistry};

/// Replace every [`Filter::Field`] with a [`Filter::Compare`] resolved
/// against the field table of the protocol reference enclosing it.
pub fn compile_fields(registry: &ProtocolRegistry, filter: Filter) -> Result<Filter, FilterError> {
    walk(registry, filter, None)
}

fn walk(
    registry: &ProtocolRegistry,
    filter: Filter,
    last: Option<ProtoId>,
) -> Result<Filter, FilterError> {
    Ok(match filter {
        Filter::Not(inner) => Filter::not(walk(registry, *inner, last)?),
        Filter::And(l, r) => Filter::and(walk(registry, *l, last)?, walk(registry, *r, last)?),
        Filter::Or(l, r) => Filter::or(walk(registry, *l, last)?, walk(registry, *r, last)?),
        Filter::Proto(p) => Filter::Proto(compile_proto(registry, p, last)?),
        Filter::Field(cmp) => {
            let parent = last.ok_or_else(|| FilterError::FieldOutsideProtocol {
                field: cmp.field.clone(),
            })?;
            Filter::Compare(compile_cmp(registry, parent, &cmp)?)
        }
        compiled @ Filter::Compare(_) => compiled,
    })
}

fn compile_proto(
    registry: &ProtocolRegistry,
    mut p: ProtoRef,
    last: Option<ProtoId>,
) -> Result<ProtoRef, FilterError> {
    if let (Some(parent), Some(id)) = (last, p.proto) {
        if !registry.has_edge(parent, id) {
            return Err(FilterError::UnknownSubprotocol {
                parent: registry.name(parent).to_string(),
                child: p.name,
            });
        }
    }
    if let Some(child) = p.child.take() {
        let Some(id) = p.proto else {
            return Err(FilterError::Internal("constraints under an unbound protocol"));
        };
        p.child = Some(Box::new(walk(registry, *child, Some(id))?));
    }
    Ok(p)
}

/// Resolve one `field=value` in the field table of `proto`.
pub fn compile_cmp(
    registry: &ProtocolRegistry,
    proto: ProtoId,
    cmp: &FieldCmp,
) -> Result<Comparison, FilterError> {
    let protocol = registry.get(proto);
    let spec = protocol
        .fields()
        .iter()
        .find(|spec| spec.name == cmp.field)
        .ok_or_else(|| FilterError::UnknownField {
            protocol: protocol.name().to_string(),
            field: cmp.field.clone(),
        })?;
    let value = spec.kind.parse(&cmp.value).ok_or_else(|| FilterError::BadValue {
        protocol: protocol.name().to_string(),
        field: cmp.field.clone(),
        value: cmp.value.clone(),
    })?;

    Ok(Comparison {
        field: spec.name,
        op: spec.op,
        value,
    })
}
