//! Labels of the edges between layout types.
use std::fmt;

use crate::OffsetExpression;

/// The relation an edge encodes between two layout types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LinkKind {
    Equality,
    Inheritance,
    Instance,
}

impl LinkKind {
    pub fn as_text(self) -> &'static str {
        match self {
            Self::Equality => "equality",
            Self::Inheritance => "inheritance",
            Self::Instance => "instance",
        }
    }
}

/// An edge label. Tags are value-like and interned by the type system so
/// that equivalent edges share one handle.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LinkTag {
    Equality,
    Inheritance,
    Instance(OffsetExpression),
}

impl LinkTag {
    pub fn instance(oe: OffsetExpression) -> Self {
        Self::Instance(oe)
    }

    pub fn kind(&self) -> LinkKind {
        match self {
            Self::Equality => LinkKind::Equality,
            Self::Inheritance => LinkKind::Inheritance,
            Self::Instance(_) => LinkKind::Instance,
        }
    }

    /// The offset expression of an instance tag. Querying any other kind is
    /// a caller bug.
    pub fn offset_expression(&self) -> &OffsetExpression {
        match self {
            Self::Instance(oe) => oe,
            _ => panic!("offset expression queried on a {} tag", self.kind().as_text()),
        }
    }
}

impl fmt::Display for LinkTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Equality => write!(f, "equality"),
            Self::Inheritance => write!(f, "inheritance"),
            Self::Instance(oe) => write!(f, "instance@{oe}"),
        }
    }
}

/// Edge predicate used by traversals and invariant checks: exactly one of
/// the three kinds, or all edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkFilter {
    Equality,
    Inheritance,
    Instance,
    All,
}

impl LinkFilter {
    pub fn admits(self, kind: LinkKind) -> bool {
        match self {
            Self::Equality => kind == LinkKind::Equality,
            Self::Inheritance => kind == LinkKind::Inheritance,
            Self::Instance => kind == LinkKind::Instance,
            Self::All => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_order_by_kind_then_offset() {
        let eq = LinkTag::Equality;
        let inh = LinkTag::Inheritance;
        let inst0 = LinkTag::instance(OffsetExpression::new(0));
        let inst8 = LinkTag::instance(OffsetExpression::new(8));

        assert!(eq < inh);
        assert!(inh < inst0);
        assert!(inst0 < inst8);
    }

    #[test]
    #[should_panic(expected = "offset expression queried")]
    fn offset_of_non_instance_tag_panics() {
        LinkTag::Inheritance.offset_expression();
    }
}
