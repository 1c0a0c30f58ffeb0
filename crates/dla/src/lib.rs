//! Data-layout analysis: an abstract type system inferred from the memory
//! behavior of lifted code.
//!
//! The graph's nodes are abstract layout types; its labeled edges encode
//! equality, inheritance and instance-at-offset relations between them.
//! [`collect`] seeds the graph from a module, [`TypeSystem::normalize`]
//! collapses it into the shape downstream consumers rely on (no equality
//! edges, inheritance forms a forest).
pub mod collect;
pub mod graphviz;
pub mod key;
pub mod link;
pub mod normalize;
pub mod offset_expr;
pub mod type_system;
pub mod verify;

pub use collect::collect;
pub use graphviz::render_to;
pub use key::{IrSlot, LayoutKey};
pub use link::{LinkFilter, LinkKind, LinkTag};
pub use offset_expr::OffsetExpression;
pub use type_system::{LayoutNode, LayoutNodeId, TagId, TypeSystem, UseSite};
