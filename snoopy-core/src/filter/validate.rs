//! Top-level validation.

use super::ast::Filter;
use crate::error::FilterError;
use crate::protocol::ProtoId;

/// Check that every protocol reference on the boolean skeleton of the tree
/// (reachable through `!`, `&&`, `||` only) is bound to `root`.
///
/// All offending names are collected before failing.
pub fn validate(filter: &Filter, root: ProtoId) -> Result<(), FilterError> {
    let mut bad = Vec::new();
    find_bogus(filter, root, &mut bad);
    if bad.is_empty() {
        Ok(())
    } else {
        Err(FilterError::BadTopLevel { names: bad })
    }
}

fn find_bogus(filter: &Filter, root: ProtoId, bad: &mut Vec<String>) {
    match filter {
        Filter::Not(inner) => find_bogus(inner, root, bad),
        Filter::And(l, r) | Filter::Or(l, r) => {
            find_bogus(l, root, bad);
            find_bogus(r, root, bad);
        }
        Filter::Proto(p) if p.proto == Some(root) => {}
        Filter::Proto(p) => bad.push(p.name.clone()),
        Filter::Field(cmp) => bad.push(format!("{}={}", cmp.field, cmp.value)),
        Filter::Compare(cmp) => bad.push(format!("{}={}", cmp.field, cmp.value)),
    }
}
