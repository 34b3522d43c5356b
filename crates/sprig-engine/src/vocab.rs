//! Attribute vocabulary
//!
//! The closed set of recognized attributes, namespaced by a prefix. An
//! element may carry several action attributes but binds to exactly
//! one: the first match in the fixed enumeration order GET, POST, IF,
//! RENDER (with HOOK as an alias), DATA.

use sprig_dom::{DomTree, NodeId};

/// The action bound to one recognized attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// `get`: fetch the URL with GET
    Get,
    /// `post`: fetch the URL with POST, carrying collected form data
    Post,
    /// `if`: conditional keep/prune, paired with a following `else`
    If,
    /// `render` (alias `hook`): evaluate an inline expression
    Render,
    /// `data`: project a stored value into the element
    Data,
}

impl ActionKind {
    /// Deterministic enumeration order for action selection
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Get,
        ActionKind::Post,
        ActionKind::If,
        ActionKind::Render,
        ActionKind::Data,
    ];

    /// Unprefixed attribute spellings for this action
    pub fn attr_names(&self) -> &'static [&'static str] {
        match self {
            ActionKind::Get => &["get"],
            ActionKind::Post => &["post"],
            ActionKind::If => &["if"],
            ActionKind::Render => &["render", "hook"],
            ActionKind::Data => &["data"],
        }
    }

    /// Content- and state-producing actions run proactively (Load);
    /// everything else waits for a gesture.
    pub fn is_data_dependent(&self) -> bool {
        matches!(self, ActionKind::If | ActionKind::Render | ActionKind::Data)
    }
}

/// Prefixed attribute vocabulary
#[derive(Debug, Clone)]
pub struct Vocabulary {
    prefix: String,
}

impl Vocabulary {
    /// Create a vocabulary with the given attribute prefix
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    /// Attribute prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Full attribute name for an unprefixed vocabulary word
    pub fn attr(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// The action bound to an element, if it carries any recognized
    /// action attribute (first match in enumeration order)
    pub fn action_for(&self, tree: &DomTree, node: NodeId) -> Option<ActionKind> {
        for kind in ActionKind::ALL {
            for name in kind.attr_names() {
                if tree.has_attribute(node, &self.attr(name)) {
                    return Some(kind);
                }
            }
        }
        None
    }

    /// The attribute value driving an element's action
    pub fn action_value<'t>(
        &self,
        tree: &'t DomTree,
        node: NodeId,
        kind: ActionKind,
    ) -> Option<&'t str> {
        kind.attr_names()
            .iter()
            .find_map(|name| tree.get_attribute(node, &self.attr(name)))
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new("sg-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element_with(attrs: &[(&str, &str)]) -> (DomTree, NodeId) {
        let mut tree = DomTree::new();
        let node = tree.create_element("div");
        let root = tree.root();
        tree.append_child(root, node).unwrap();
        let elem = tree.get_mut(node).unwrap().as_element_mut().unwrap();
        for (name, value) in attrs {
            elem.set_attr(name, value);
        }
        (tree, node)
    }

    #[test]
    fn test_action_lookup() {
        let vocab = Vocabulary::default();
        let (tree, node) = element_with(&[("sg-get", "/api")]);
        assert_eq!(vocab.action_for(&tree, node), Some(ActionKind::Get));

        let (tree, node) = element_with(&[("sg-data", "todo.items")]);
        assert_eq!(vocab.action_for(&tree, node), Some(ActionKind::Data));

        let (tree, node) = element_with(&[("class", "plain")]);
        assert_eq!(vocab.action_for(&tree, node), None);
    }

    #[test]
    fn test_hook_is_render_alias() {
        let vocab = Vocabulary::default();
        let (tree, node) = element_with(&[("sg-hook", "'x'")]);
        assert_eq!(vocab.action_for(&tree, node), Some(ActionKind::Render));
        assert_eq!(
            vocab.action_value(&tree, node, ActionKind::Render),
            Some("'x'")
        );
    }

    #[test]
    fn test_first_match_wins() {
        // get comes before data in the enumeration order
        let vocab = Vocabulary::default();
        let (tree, node) = element_with(&[("sg-data", "todo.items"), ("sg-get", "/api")]);
        assert_eq!(vocab.action_for(&tree, node), Some(ActionKind::Get));
    }

    #[test]
    fn test_custom_prefix() {
        let vocab = Vocabulary::new("x-");
        let (tree, node) = element_with(&[("x-if", "true")]);
        assert_eq!(vocab.action_for(&tree, node), Some(ActionKind::If));
        assert_eq!(vocab.attr("trigger"), "x-trigger");
    }
}
