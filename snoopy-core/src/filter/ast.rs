//! Filter tree.
//!
//! The parser produces a tree of [`Filter`] nodes holding names and raw
//! literals. Each compile stage consumes the tree and returns a rebuilt one:
//! completion binds [`ProtoRef`]s to protocols, field compilation replaces
//! [`FieldCmp`] nodes with typed [`Comparison`]s.

use std::fmt;

use crate::protocol::{Comparison, ProtoId};

/// A filter expression node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Logical NOT
    Not(Box<Filter>),
    /// Logical AND, evaluated left to right
    And(Box<Filter>, Box<Filter>),
    /// Logical OR, evaluated left to right
    Or(Box<Filter>, Box<Filter>),
    /// Protocol reference, optionally constraining what is inside it
    Proto(ProtoRef),
    /// Raw `field=value` as written
    Field(FieldCmp),
    /// Compiled field comparison
    Compare(Comparison),
}

/// `name` or `name(child)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtoRef {
    pub name: String,
    /// Set by completion when `name` resolves
    pub proto: Option<ProtoId>,
    pub child: Option<Box<Filter>>,
}

/// `field=value` before the field compiler has typed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCmp {
    pub field: String,
    pub value: String,
}

impl Filter {
    /// Create a NOT expression.
    #[allow(clippy::should_implement_trait)]
    pub fn not(expr: Filter) -> Self {
        Filter::Not(Box::new(expr))
    }

    /// Create an AND expression.
    pub fn and(left: Filter, right: Filter) -> Self {
        Filter::And(Box::new(left), Box::new(right))
    }

    /// Create an OR expression.
    pub fn or(left: Filter, right: Filter) -> Self {
        Filter::Or(Box::new(left), Box::new(right))
    }

    /// Create an unbound, childless protocol reference.
    pub fn proto(name: impl Into<String>) -> Self {
        Filter::Proto(ProtoRef {
            name: name.into(),
            proto: None,
            child: None,
        })
    }

    /// Create an unbound protocol reference with a constraint inside it.
    pub fn proto_with(name: impl Into<String>, child: Filter) -> Self {
        Filter::Proto(ProtoRef {
            name: name.into(),
            proto: None,
            child: Some(Box::new(child)),
        })
    }

    /// Create a raw field comparison.
    pub fn field(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Field(FieldCmp {
            field: field.into(),
            value: value.into(),
        })
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub(crate) fn height(&self) -> usize {
        match self {
            Filter::Not(inner) => 1 + inner.height(),
            Filter::And(l, r) | Filter::Or(l, r) => 1 + l.height().max(r.height()),
            Filter::Proto(p) => 1 + p.child.as_ref().map_or(0, |c| c.height()),
            Filter::Field(_) | Filter::Compare(_) => 1,
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Filter::Or(..) => 1,
            Filter::And(..) => 2,
            _ => 3,
        }
    }

    fn fmt_prec(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        let parens = self.precedence() < min;
        if parens {
            f.write_str("(")?;
        }
        match self {
            Filter::Not(inner) => {
                f.write_str("!")?;
                inner.fmt_prec(f, 3)?;
            }
            Filter::And(l, r) => {
                l.fmt_prec(f, 2)?;
                f.write_str(" && ")?;
                r.fmt_prec(f, 3)?;
            }
            Filter::Or(l, r) => {
                l.fmt_prec(f, 1)?;
                f.write_str(" || ")?;
                r.fmt_prec(f, 2)?;
            }
            Filter::Proto(p) => {
                f.write_str(&p.name)?;
                if let Some(child) = &p.child {
                    f.write_str("(")?;
                    child.fmt_prec(f, 0)?;
                    f.write_str(")")?;
                }
            }
            Filter::Field(cmp) => write!(f, "{}={}", cmp.field, cmp.value)?,
            Filter::Compare(cmp) => write!(f, "{}={}", cmp.field, cmp.value)?,
        }
        if parens {
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_prec(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::FieldValue;

    #[test]
    fn test_display_minimal_parens() {
        let f = Filter::or(
            Filter::and(Filter::proto("a"), Filter::proto("b")),
            Filter::proto("c"),
        );
        assert_eq!(f.to_string(), "a && b || c");

        let f = Filter::and(
            Filter::or(Filter::proto("a"), Filter::proto("b")),
            Filter::proto("c"),
        );
        assert_eq!(f.to_string(), "(a || b) && c");

        let f = Filter::not(Filter::or(Filter::proto("a"), Filter::proto("b")));
        assert_eq!(f.to_string(), "!(a || b)");
    }

    #[test]
    fn test_display_right_nested_keeps_grouping() {
        let f = Filter::or(
            Filter::proto("a"),
            Filter::or(Filter::proto("b"), Filter::proto("c")),
        );
        assert_eq!(f.to_string(), "a || (b || c)");
    }

    #[test]
    fn test_display_proto_and_fields() {
        let f = Filter::proto_with(
            "ether",
            Filter::proto_with("ip", Filter::field("src", "10.0.0.1")),
        );
        assert_eq!(f.to_string(), "ether(ip(src=10.0.0.1))");

        let f = Filter::Compare(Comparison {
            field: "port",
            op: 0,
            value: FieldValue::Num(80),
        });
        assert_eq!(f.to_string(), "port=80");
    }
}
