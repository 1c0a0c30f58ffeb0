use std::fmt;

/// Linkage of a function or global variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Linkage {
    /// Defined in the binary and visible outside.
    Public,

    /// Defined in the binary and only visible inside.
    Private,

    /// Declared but defined elsewhere.
    External,
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Private => write!(f, "private"),
            Self::External => write!(f, "external"),
        }
    }
}
