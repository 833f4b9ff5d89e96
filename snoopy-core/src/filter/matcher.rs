//! Runtime evaluation of a compiled filter against one packet.

use super::ast::Filter;
use crate::error::FilterError;
use crate::protocol::{MatchContext, Test};

/// Evaluate `filter` with `ctx` positioned at the start of a packet.
///
/// No filter accepts everything.
pub fn matches(filter: Option<&Filter>, mut ctx: MatchContext<'_>) -> Result<bool, FilterError> {
    match filter {
        None => Ok(true),
        Some(f) => eval(f, &mut ctx),
    }
}

/// Evaluate one node.
///
/// `&&` and `||` run their left operand on a copy of the context and their
/// right operand on the caller's context, so header bytes consumed while
/// testing the left side are still there for the right side. Only the right
/// side's advancement is visible to the caller.
pub fn eval(filter: &Filter, ctx: &mut MatchContext<'_>) -> Result<bool, FilterError> {
    match filter {
        Filter::Not(inner) => Ok(!eval(inner, ctx)?),
        Filter::And(l, r) => {
            let mut left = *ctx;
            Ok(eval(l, &mut left)? && eval(r, ctx)?)
        }
        Filter::Or(l, r) => {
            let mut left = *ctx;
            Ok(eval(l, &mut left)? || eval(r, ctx)?)
        }
        Filter::Compare(cmp) => Ok(match ctx.proto() {
            Some(current) => ctx.registry().get(current).filter(&Test::Field(cmp), ctx),
            None => true,
        }),
        Filter::Proto(p) => {
            // Unknown protocols never appear in a packet
            let Some(id) = p.proto else {
                return Ok(false);
            };
            if ctx.need_root() {
                if ctx.proto() != Some(id) {
                    return Ok(false);
                }
                ctx.clear_need_root();
            } else if let Some(current) = ctx.proto() {
                if !ctx.registry().get(current).filter(&Test::Next(id), ctx) {
                    return Ok(false);
                }
            }
            match &p.child {
                None => Ok(true),
                Some(child) => {
                    ctx.set_proto(Some(id));
                    eval(child, ctx)
                }
            }
        }
        Filter::Field(_) => Err(FilterError::Internal("uncompiled field comparison")),
    }
}
