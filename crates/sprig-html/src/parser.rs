//! HTML parser
//!
//! Uses html5ever's built-in RcDom and converts to our DOM format.
//! Fragments go through a full document parse with a synthetic body
//! wrapper; the body's children become the detached fragment.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};
use sprig_dom::{Document, DomTree, NodeId};

/// HTML parser
pub struct HtmlParser;

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self
    }

    /// Parse an HTML string into a Document
    pub fn parse(&self, html: &str) -> Document {
        self.parse_with_url(html, "about:blank")
    }

    /// Parse HTML with a base URL
    pub fn parse_with_url(&self, html: &str, url: &str) -> Document {
        tracing::debug!("parsing HTML document: {}", url);

        // The in-memory reader cannot fail; a default (empty) dom keeps
        // the call infallible.
        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
            .unwrap_or_default();

        let mut tree = DomTree::new();
        let root = tree.root();
        convert_children(&mut tree, &dom.document, root);

        tracing::debug!("parsed {} nodes", tree.len());
        Document::from_tree(tree, url)
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse markup into detached nodes allocated inside `tree`
///
/// Returns the top-level nodes of the fragment in document order; none
/// of them is attached anywhere yet.
pub fn parse_fragment(tree: &mut DomTree, markup: &str) -> Vec<NodeId> {
    let wrapped = format!("<html><body>{markup}</body></html>");
    // Same infallible in-memory read as the document parse above.
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut wrapped.as_bytes())
        .unwrap_or_default();

    let Some(body) = find_body(&dom.document) else {
        tracing::error!("fragment parse produced no body element");
        return Vec::new();
    };

    let mut out = Vec::new();
    for child in body.children.borrow().iter() {
        if let Some(id) = convert_subtree(tree, child) {
            out.push(id);
        }
    }
    out
}

fn find_body(document: &Handle) -> Option<Handle> {
    for child in document.children.borrow().iter() {
        if is_element_named(child, "html") {
            for inner in child.children.borrow().iter() {
                if is_element_named(inner, "body") {
                    return Some(inner.clone());
                }
            }
        }
    }
    None
}

fn is_element_named(handle: &Handle, tag: &str) -> bool {
    matches!(&handle.data, RcNodeData::Element { name, .. } if name.local.as_ref() == tag)
}

/// Convert one RcDom node into a fresh (detached) arena node
///
/// Whitespace-only text and non-content nodes (doctype, processing
/// instructions) produce nothing.
fn make_node(tree: &mut DomTree, handle: &Handle) -> Option<NodeId> {
    match &handle.data {
        RcNodeData::Text { contents } => {
            let text = contents.borrow();
            if text.trim().is_empty() {
                None
            } else {
                Some(tree.create_text(&text))
            }
        }
        RcNodeData::Comment { contents } => Some(tree.create_comment(contents)),
        RcNodeData::Element { name, attrs, .. } => {
            let id = tree.create_element(name.local.as_ref());
            if let Some(elem) = tree.get_mut(id).and_then(|n| n.as_element_mut()) {
                for attr in attrs.borrow().iter() {
                    elem.set_attr(attr.name.local.as_ref(), &attr.value);
                }
            }
            Some(id)
        }
        _ => None,
    }
}

/// Convert a subtree, returning its detached top node
fn convert_subtree(tree: &mut DomTree, handle: &Handle) -> Option<NodeId> {
    let top = make_node(tree, handle)?;
    // Explicit stack, reversed children so the pop order is document order.
    let mut stack: Vec<(Handle, NodeId)> = handle
        .children
        .borrow()
        .iter()
        .rev()
        .map(|c| (c.clone(), top))
        .collect();

    while let Some((h, parent)) = stack.pop() {
        if let Some(id) = make_node(tree, &h) {
            if tree.append_child(parent, id).is_err() {
                tracing::error!("failed to attach converted node");
                continue;
            }
            for child in h.children.borrow().iter().rev() {
                stack.push((child.clone(), id));
            }
        }
    }
    Some(top)
}

/// Convert every child of an RcDom handle under `parent`
fn convert_children(tree: &mut DomTree, handle: &Handle, parent: NodeId) {
    for child in handle.children.borrow().iter() {
        match &child.data {
            // The document handle nests everything else.
            RcNodeData::Document => convert_children(tree, child, parent),
            _ => {
                if let Some(id) = convert_subtree(tree, child) {
                    if tree.append_child(parent, id).is_err() {
                        tracing::error!("failed to attach parsed node");
                    }
                }
            }
        }
    }
}
