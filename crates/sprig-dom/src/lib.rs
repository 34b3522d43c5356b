//! Sprig DOM - Document tree
//!
//! Arena-based document tree: nodes are stored in a flat vector and
//! linked by `NodeId` indices. Detached nodes stay in the arena for the
//! lifetime of the document.

mod document;
mod node;
mod query;
mod tree;

pub use document::{Document, ReadyState};
pub use node::{Attribute, ElementData, Node, NodeData, TextData};
pub use query::Selector;
pub use tree::{DomError, DomResult, DomTree};

/// Node identifier (index into the arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check that this ID refers to a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }
}
