//! DOM Tree (arena-based allocation)
//!
//! Mutation primitives: append, detach, replace a node, replace a
//! node's contents. Detached nodes keep their arena slot; slots are
//! never reclaimed (the arena lives as long as the page).

use crate::{Node, NodeId};

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node not found in the arena
    #[error("node not found")]
    NotFound,

    /// Structurally invalid request (cycle, missing parent)
    #[error("hierarchy request error: {0}")]
    Hierarchy(&'static str),
}

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl DomTree {
    /// Create a new tree containing only the document root
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
        }
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)
    }

    /// Document root ID
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of arena slots (live and detached)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached element node
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(Node::element(tag))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.alloc(Node::text(content.to_string()))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.alloc(Node::comment(content.to_string()))
    }

    /// Parent of a node (NONE when detached or root)
    pub fn parent(&self, id: NodeId) -> NodeId {
        self.get(id).map_or(NodeId::NONE, |n| n.parent)
    }

    /// Next sibling of a node
    pub fn next_sibling(&self, id: NodeId) -> NodeId {
        self.get(id).map_or(NodeId::NONE, |n| n.next_sibling)
    }

    /// Check whether `ancestor` is `node` itself or one of its ancestors
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = node;
        while cur.is_valid() {
            if cur == ancestor {
                return true;
            }
            cur = self.parent(cur);
        }
        false
    }

    /// Append a child as the last child of `parent`
    ///
    /// The child is detached from any previous position first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        if self.get(parent).is_none() || self.get(child).is_none() {
            return Err(DomError::NotFound);
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(DomError::Hierarchy("cannot append a node inside itself"));
        }
        self.detach(child)?;

        let prev_last = self.get(parent).map(|n| n.last_child).unwrap_or(NodeId::NONE);
        {
            let node = self.get_mut(child).ok_or(DomError::NotFound)?;
            node.parent = parent;
            node.prev_sibling = prev_last;
            node.next_sibling = NodeId::NONE;
        }
        if prev_last.is_valid() {
            if let Some(prev) = self.get_mut(prev_last) {
                prev.next_sibling = child;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.first_child = child;
        }
        if let Some(p) = self.get_mut(parent) {
            p.last_child = child;
        }
        Ok(child)
    }

    /// Insert `new` immediately before `reference` under the same parent
    pub fn insert_before(&mut self, new: NodeId, reference: NodeId) -> DomResult<NodeId> {
        let parent = self.parent(reference);
        if !parent.is_valid() {
            return Err(DomError::Hierarchy("reference node has no parent"));
        }
        if self.get(new).is_none() {
            return Err(DomError::NotFound);
        }
        if self.is_ancestor_or_self(new, parent) {
            return Err(DomError::Hierarchy("cannot insert a node inside itself"));
        }
        self.detach(new)?;

        let prev = self.get(reference).map(|n| n.prev_sibling).unwrap_or(NodeId::NONE);
        {
            let node = self.get_mut(new).ok_or(DomError::NotFound)?;
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = reference;
        }
        if prev.is_valid() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = new;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.first_child = new;
        }
        if let Some(r) = self.get_mut(reference) {
            r.prev_sibling = new;
        }
        Ok(new)
    }

    /// Unlink a node from its parent and siblings
    ///
    /// The node (and its subtree) stays in the arena, detached.
    pub fn detach(&mut self, id: NodeId) -> DomResult<()> {
        let (parent, prev, next) = {
            let node = self.get(id).ok_or(DomError::NotFound)?;
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        if !parent.is_valid() {
            return Ok(());
        }
        if prev.is_valid() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = next;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.first_child = next;
        }
        if next.is_valid() {
            if let Some(n) = self.get_mut(next) {
                n.prev_sibling = prev;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.last_child = prev;
        }
        if let Some(node) = self.get_mut(id) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
        Ok(())
    }

    /// Substitute `target` with a fragment of detached nodes
    ///
    /// The target itself leaves the tree; the fragment takes its place
    /// in sibling order.
    pub fn replace_node(&mut self, target: NodeId, fragment: &[NodeId]) -> DomResult<()> {
        if !self.parent(target).is_valid() {
            return Err(DomError::Hierarchy("replacement target has no parent"));
        }
        tracing::trace!("substituting {:?} with {} nodes", target, fragment.len());
        for &id in fragment {
            self.insert_before(id, target)?;
        }
        self.detach(target)
    }

    /// Replace the contents of `target` with a fragment of detached nodes
    ///
    /// The target stays; its previous children are detached.
    pub fn set_contents(&mut self, target: NodeId, fragment: &[NodeId]) -> DomResult<()> {
        if self.get(target).is_none() {
            return Err(DomError::NotFound);
        }
        tracing::trace!("replacing contents of {:?} with {} nodes", target, fragment.len());
        let mut child = self.get(target).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        while child.is_valid() {
            let next = self.next_sibling(child);
            self.detach(child)?;
            child = next;
        }
        for &id in fragment {
            self.append_child(target, id)?;
        }
        Ok(())
    }

    /// Replace the contents of `target` with a single text node
    pub fn set_text_contents(&mut self, target: NodeId, text: &str) -> DomResult<()> {
        let text_node = self.create_text(text);
        self.set_contents(target, &[text_node])
    }

    /// Iterate the direct children of a node
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        ChildIter {
            tree: self,
            next: self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE),
        }
    }

    /// Iterate all descendants of `start` in pre-order, depth-first
    ///
    /// Iterative with an explicit stack; the start node itself is not
    /// yielded.
    pub fn descendants(&self, start: NodeId) -> DescendantIter<'_> {
        let mut stack = Vec::new();
        if let Some(node) = self.get(start) {
            if node.first_child.is_valid() {
                stack.push(node.first_child);
            }
        }
        DescendantIter { tree: self, stack }
    }

    /// Concatenated text of a node's subtree
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.get(id).and_then(|n| n.as_text()) {
            out.push_str(text);
        }
        for desc in self.descendants(id) {
            if let Some(text) = self.get(desc).and_then(|n| n.as_text()) {
                out.push_str(text);
            }
        }
        out
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over direct children
pub struct ChildIter<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if !self.next.is_valid() {
            return None;
        }
        let id = self.next;
        self.next = self.tree.next_sibling(id);
        Some(id)
    }
}

/// Pre-order, depth-first descendant iterator (explicit stack)
pub struct DescendantIter<'a> {
    tree: &'a DomTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for DescendantIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        if let Some(node) = self.tree.get(id) {
            // Sibling below child: the child subtree comes out first.
            if node.next_sibling.is_valid() {
                self.stack.push(node.next_sibling);
            }
            if node.first_child.is_valid() {
                self.stack.push(node.first_child);
            }
        }
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> (DomTree, NodeId, NodeId, NodeId) {
        let mut tree = DomTree::new();
        let body = tree.create_element("body");
        let a = tree.create_element("div");
        let b = tree.create_element("span");
        tree.append_child(tree.root(), body).unwrap();
        tree.append_child(body, a).unwrap();
        tree.append_child(body, b).unwrap();
        (tree, body, a, b)
    }

    #[test]
    fn test_append_and_siblings() {
        let (tree, body, a, b) = sample_tree();
        assert_eq!(tree.get(body).unwrap().first_child, a);
        assert_eq!(tree.get(body).unwrap().last_child, b);
        assert_eq!(tree.next_sibling(a), b);
        assert_eq!(tree.get(b).unwrap().prev_sibling, a);
    }

    #[test]
    fn test_detach_relinks_siblings() {
        let (mut tree, body, a, b) = sample_tree();
        tree.detach(a).unwrap();
        assert_eq!(tree.get(body).unwrap().first_child, b);
        assert_eq!(tree.get(b).unwrap().prev_sibling, NodeId::NONE);
        assert!(!tree.parent(a).is_valid());
    }

    #[test]
    fn test_preorder_descendants() {
        let (mut tree, _body, a, b) = sample_tree();
        let a1 = tree.create_element("p");
        let a2 = tree.create_element("em");
        tree.append_child(a, a1).unwrap();
        tree.append_child(a1, a2).unwrap();

        let order: Vec<NodeId> = tree.descendants(tree.root()).collect();
        // body, div, p, em, span
        assert_eq!(order.len(), 5);
        let pos = |id| order.iter().position(|&n| n == id).unwrap();
        assert!(pos(a) < pos(a1));
        assert!(pos(a1) < pos(a2));
        assert!(pos(a2) < pos(b));
    }

    #[test]
    fn test_replace_node_substitutes() {
        let (mut tree, body, a, b) = sample_tree();
        let new1 = tree.create_element("ul");
        let new2 = tree.create_text("tail");
        tree.replace_node(a, &[new1, new2]).unwrap();

        let kids: Vec<NodeId> = tree.children(body).collect();
        assert_eq!(kids, vec![new1, new2, b]);
        assert!(!tree.parent(a).is_valid());
    }

    #[test]
    fn test_replace_detached_node_fails() {
        let (mut tree, _body, a, _b) = sample_tree();
        tree.detach(a).unwrap();
        let repl = tree.create_text("x");
        assert!(matches!(
            tree.replace_node(a, &[repl]),
            Err(DomError::Hierarchy(_))
        ));
    }

    #[test]
    fn test_set_contents_keeps_target() {
        let (mut tree, body, a, _b) = sample_tree();
        let old_child = tree.create_text("old");
        tree.append_child(a, old_child).unwrap();

        let fresh = tree.create_text("fresh");
        tree.set_contents(a, &[fresh]).unwrap();

        assert_eq!(tree.parent(a), body);
        assert_eq!(tree.text_content(a), "fresh");
        assert!(!tree.parent(old_child).is_valid());
    }

    #[test]
    fn test_append_cycle_rejected() {
        let (mut tree, body, a, _b) = sample_tree();
        assert!(matches!(
            tree.append_child(a, body),
            Err(DomError::Hierarchy(_))
        ));
    }
}
