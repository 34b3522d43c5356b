//! Tree queries
//!
//! Attribute lookup, nearest-sibling search, and a small selector
//! engine (tag, `#id`, `.class`, `[attr]`, `[attr=v]`, `[attr^=v]`,
//! compounds thereof — no combinators) used for target resolution.

use crate::{DomTree, NodeId};

impl DomTree {
    /// Get an attribute value from an element node
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id)?.as_element()?.get_attr(name)
    }

    /// Check whether an element node carries an attribute
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.get(id)
            .and_then(|n| n.as_element())
            .is_some_and(|e| e.has_attr(name))
    }

    /// Find the nearest following sibling carrying `name`
    pub fn following_sibling_with_attribute(&self, id: NodeId, name: &str) -> Option<NodeId> {
        let mut sibling = self.next_sibling(id);
        while sibling.is_valid() {
            if self.has_attribute(sibling, name) {
                return Some(sibling);
            }
            sibling = self.next_sibling(sibling);
        }
        None
    }

    /// All element nodes reachable from the root, in document order
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(self.root())
            .filter(|&id| self.get(id).is_some_and(|n| n.is_element()))
    }

    /// First element in document order matching the selector
    pub fn query_selector(&self, selector: &Selector) -> Option<NodeId> {
        self.elements().find(|&id| selector.matches(self, id))
    }

    /// Every element matching the selector, in document order
    pub fn query_selector_all(&self, selector: &Selector) -> Vec<NodeId> {
        self.elements()
            .filter(|&id| selector.matches(self, id))
            .collect()
    }
}

/// Attribute test inside a selector
#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrMatch {
    Present,
    Equals(String),
    Prefix(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrTest {
    name: String,
    matcher: AttrMatch,
}

/// A parsed compound selector
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    class: Option<String>,
    attrs: Vec<AttrTest>,
}

impl Selector {
    /// Parse a compound selector. Returns None for anything outside the
    /// supported grammar.
    pub fn parse(input: &str) -> Option<Selector> {
        let input = input.trim();
        if input.is_empty() || input.contains(char::is_whitespace) {
            return None;
        }
        let mut sel = Selector::default();
        let mut rest = input;

        // Leading tag name or universal
        if let Some(end) = rest.find(['#', '.', '[']) {
            if end > 0 {
                let tag = &rest[..end];
                if tag != "*" {
                    sel.tag = Some(tag.to_ascii_lowercase());
                }
                rest = &rest[end..];
            }
        } else {
            if rest != "*" {
                sel.tag = Some(rest.to_ascii_lowercase());
            }
            return Some(sel);
        }

        while !rest.is_empty() {
            let head = rest.chars().next()?;
            match head {
                '#' | '.' => {
                    let tail = &rest[1..];
                    let end = tail.find(['#', '.', '[']).unwrap_or(tail.len());
                    if end == 0 {
                        return None;
                    }
                    let value = tail[..end].to_string();
                    if head == '#' {
                        sel.id = Some(value);
                    } else {
                        sel.class = Some(value);
                    }
                    rest = &tail[end..];
                }
                '[' => {
                    let close = rest.find(']')?;
                    let body = &rest[1..close];
                    sel.attrs.push(Self::parse_attr_test(body)?);
                    rest = &rest[close + 1..];
                }
                _ => return None,
            }
        }
        Some(sel)
    }

    fn parse_attr_test(body: &str) -> Option<AttrTest> {
        let strip_quotes = |v: &str| {
            let v = v.trim();
            if (v.starts_with('"') && v.ends_with('"') && v.len() >= 2)
                || (v.starts_with('\'') && v.ends_with('\'') && v.len() >= 2)
            {
                v[1..v.len() - 1].to_string()
            } else {
                v.to_string()
            }
        };

        if let Some(eq) = body.find("^=") {
            let name = body[..eq].trim();
            if name.is_empty() {
                return None;
            }
            Some(AttrTest {
                name: name.to_string(),
                matcher: AttrMatch::Prefix(strip_quotes(&body[eq + 2..])),
            })
        } else if let Some(eq) = body.find('=') {
            let name = body[..eq].trim();
            if name.is_empty() {
                return None;
            }
            Some(AttrTest {
                name: name.to_string(),
                matcher: AttrMatch::Equals(strip_quotes(&body[eq + 1..])),
            })
        } else {
            let name = body.trim();
            if name.is_empty() {
                return None;
            }
            Some(AttrTest {
                name: name.to_string(),
                matcher: AttrMatch::Present,
            })
        }
    }

    /// Test an element against this selector
    pub fn matches(&self, tree: &DomTree, id: NodeId) -> bool {
        let Some(elem) = tree.get(id).and_then(|n| n.as_element()) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if elem.tag != *tag {
                return false;
            }
        }
        if let Some(want) = &self.id {
            if elem.get_attr("id") != Some(want.as_str()) {
                return false;
            }
        }
        if let Some(class) = &self.class {
            let found = elem
                .get_attr("class")
                .is_some_and(|v| v.split_whitespace().any(|c| c == class));
            if !found {
                return false;
            }
        }
        for test in &self.attrs {
            let value = elem.get_attr(&test.name);
            let ok = match &test.matcher {
                AttrMatch::Present => value.is_some(),
                AttrMatch::Equals(want) => value == Some(want.as_str()),
                AttrMatch::Prefix(want) => value.is_some_and(|v| v.starts_with(want.as_str())),
            };
            if !ok {
                return false;
            }
        }
        true
    }
}
