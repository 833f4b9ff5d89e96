//! Fixpoint rewriting of a completed filter tree.
//!
//! Completion tends to produce repeated prefixes: `tcp(port=80) ||
//! tcp(port=443)` becomes two full `ether(ip(tcp(..)))` chains. Merging
//! common protocol references under `||` and `&&` lets the matcher decode
//! each shared header once. Every rewrite preserves the set of accepted
//! packets.

use super::ast::{Filter, ProtoRef};

/// Apply rewrite passes until one of them changes nothing.
pub fn optimize(mut filter: Filter) -> Filter {
    loop {
        let (next, changed) = optimize_pass(filter);
        filter = next;
        if !changed {
            return filter;
        }
    }
}

/// One top-down rewrite pass. Returns the new tree and whether any rule fired.
pub fn optimize_pass(filter: Filter) -> (Filter, bool) {
    let mut changed = false;
    let filter = rewrite(filter, &mut changed);
    (filter, changed)
}

fn rewrite(filter: Filter, changed: &mut bool) -> Filter {
    match filter {
        Filter::Not(inner) => match *inner {
            Filter::Not(x) => {
                *changed = true;
                *x
            }
            other => Filter::not(rewrite(other, changed)),
        },
        Filter::Or(l, r) => match same_protocol(*l, *r) {
            Ok((lp, rp)) => {
                *changed = true;
                match (lp.child, rp.child) {
                    // Either side alone already accepts everything the other does
                    (None, _) => Filter::Proto(ProtoRef { child: None, ..lp }),
                    (_, None) => Filter::Proto(ProtoRef { child: None, ..rp }),
                    (Some(lc), Some(rc)) => Filter::Proto(ProtoRef {
                        child: Some(Box::new(Filter::Or(lc, rc))),
                        ..lp
                    }),
                }
            }
            Err((l, r)) => Filter::or(rewrite(l, changed), rewrite(r, changed)),
        },
        Filter::And(l, r) => match same_protocol(*l, *r) {
            Ok((lp, rp)) => {
                *changed = true;
                match (lp.child, rp.child) {
                    // A bare reference adds nothing to the other side
                    (None, rc) => Filter::Proto(ProtoRef { child: rc, ..rp }),
                    (lc, None) => Filter::Proto(ProtoRef { child: lc, ..lp }),
                    (Some(lc), Some(rc)) => Filter::Proto(ProtoRef {
                        child: Some(Box::new(Filter::and(
                            rewrite(*lc, changed),
                            rewrite(*rc, changed),
                        ))),
                        ..lp
                    }),
                }
            }
            Err((l, r)) => Filter::and(rewrite(l, changed), rewrite(r, changed)),
        },
        Filter::Proto(mut p) => {
            if let Some(child) = p.child.take() {
                p.child = Some(Box::new(rewrite(*child, changed)));
            }
            Filter::Proto(p)
        }
        leaf @ (Filter::Field(_) | Filter::Compare(_)) => leaf,
    }
}

/// Split two operands into protocol references when both are bound to the
/// same protocol, otherwise hand them back untouched.
fn same_protocol(l: Filter, r: Filter) -> Result<(ProtoRef, ProtoRef), (Filter, Filter)> {
    match (l, r) {
        (Filter::Proto(lp), Filter::Proto(rp)) if lp.proto.is_some() && lp.proto == rp.proto => {
            Ok((lp, rp))
        }
        (l, r) => Err((l, r)),
    }
}
