//! Document - High-level document API

use crate::{DomTree, NodeId};

/// Document readiness, as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// Still being built; binding must wait
    Loading,
    /// Fully parsed; binding may run immediately
    Ready,
}

/// A document: a DOM tree plus its URL and ready state
#[derive(Debug)]
pub struct Document {
    tree: DomTree,
    url: String,
    ready_state: ReadyState,
}

impl Document {
    /// Create an empty, ready document
    pub fn new(url: &str) -> Self {
        Self {
            tree: DomTree::new(),
            url: url.to_string(),
            ready_state: ReadyState::Ready,
        }
    }

    /// Create an empty document that is still loading
    pub fn loading(url: &str) -> Self {
        Self {
            tree: DomTree::new(),
            url: url.to_string(),
            ready_state: ReadyState::Loading,
        }
    }

    /// Wrap an existing tree as a ready document
    pub fn from_tree(tree: DomTree, url: &str) -> Self {
        Self {
            tree,
            url: url.to_string(),
            ready_state: ReadyState::Ready,
        }
    }

    /// Document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current ready state
    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    /// Check readiness
    pub fn is_ready(&self) -> bool {
        self.ready_state == ReadyState::Ready
    }

    /// Mark the document as fully parsed
    pub fn set_ready(&mut self) {
        self.ready_state = ReadyState::Ready;
    }

    /// Get element by ID (document order)
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree
            .elements()
            .find(|&e| self.tree.get_attribute(e, "id") == Some(id))
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_state() {
        let mut doc = Document::loading("test://page");
        assert!(!doc.is_ready());
        doc.set_ready();
        assert!(doc.is_ready());
    }

    #[test]
    fn test_get_element_by_id() {
        let mut doc = Document::new("test://page");
        let div = doc.tree_mut().create_element("div");
        let root = doc.tree().root();
        doc.tree_mut().append_child(root, div).unwrap();
        doc.tree_mut()
            .get_mut(div)
            .unwrap()
            .as_element_mut()
            .unwrap()
            .set_attr("id", "main");

        assert_eq!(doc.get_element_by_id("main"), Some(div));
        assert_eq!(doc.get_element_by_id("missing"), None);
    }
}
