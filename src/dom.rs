//! Typed queries over a parsed page snapshot.
//!
//! The snapshot is a `dom_query::Document`: an owned tree-of-nodes value that
//! can be built from any HTML string, including hand-written fixtures. This
//! module adds the handful of queries the ad heuristics need on top of CSS
//! selection: nearest-ancestor-matching, find-by-attribute, find-by-text and
//! "longest meaningful text".

use regex::Regex;

// Re-export core types for external use
pub use dom_query::{Document, NodeRef, Selection};

use crate::patterns::NON_TEXT_TAGS;
use crate::text::is_separator_only;

// === Parsing ===

/// Parse an HTML string into a document tree.
#[inline]
#[must_use]
pub fn parse(html: &str) -> Document {
    Document::from(html)
}

// === Node Information ===

/// Lowercase tag name of a node, `None` for text and comment nodes.
#[must_use]
pub fn node_tag(node: &NodeRef) -> Option<String> {
    if !node.is_element() {
        return None;
    }
    node.node_name().map(|t| t.to_ascii_lowercase())
}

/// Attribute value of a single node.
#[inline]
#[must_use]
pub fn attribute(node: &NodeRef, name: &str) -> Option<String> {
    Selection::from(*node).attr(name).map(|s| s.to_string())
}

/// True when every token in `classes` appears in the node's class list.
#[must_use]
pub fn has_classes(node: &NodeRef, classes: &[&str]) -> bool {
    let Some(class) = attribute(node, "class") else {
        return false;
    };
    classes
        .iter()
        .all(|wanted| class.split_whitespace().any(|token| token == *wanted))
}

/// Text content of the node and its descendants, trimmed.
#[must_use]
pub fn trimmed_text(node: &NodeRef) -> String {
    node.text().trim().to_string()
}

// === Tree Navigation ===

/// Nearest node, starting from `node` itself, whose tag is one of `tags`.
#[must_use]
pub fn closest<'a>(node: &NodeRef<'a>, tags: &[&str]) -> Option<NodeRef<'a>> {
    let mut current = Some(*node);
    while let Some(n) = current {
        if node_tag(&n).is_some_and(|t| tags.contains(&t.as_str())) {
            return Some(n);
        }
        current = n.parent();
    }
    None
}

/// Next sibling that is an element, skipping text nodes.
#[must_use]
pub fn next_element_sibling<'a>(node: &NodeRef<'a>) -> Option<NodeRef<'a>> {
    let mut sibling = node.next_sibling();
    while let Some(s) = sibling {
        if s.is_element() {
            return Some(s);
        }
        sibling = s.next_sibling();
    }
    None
}

// === Querying ===

/// Descendants of `root` matching a CSS selector, in document order.
#[must_use]
pub fn select_all<'a>(root: &NodeRef<'a>, selector: &str) -> Vec<NodeRef<'a>> {
    Selection::from(*root).select(selector).nodes().to_vec()
}

/// First descendant of `root` matching a CSS selector.
#[must_use]
pub fn select_first<'a>(root: &NodeRef<'a>, selector: &str) -> Option<NodeRef<'a>> {
    Selection::from(*root)
        .select_single(selector)
        .nodes()
        .first()
        .copied()
}

/// Descendant elements of `root` (inclusive) with the given tag whose
/// attribute `name` satisfies `accept`.
#[must_use]
pub fn find_by_attribute<'a>(
    root: &NodeRef<'a>,
    tag: &str,
    name: &str,
    accept: impl Fn(&str) -> bool,
) -> Vec<NodeRef<'a>> {
    let mut found = Vec::new();
    walk_elements(root, &mut |node| {
        if node_tag(node).as_deref() == Some(tag)
            && attribute(node, name).is_some_and(|v| accept(&v))
        {
            found.push(*node);
        }
        true
    });
    found
}

/// First element (inclusive, document order) one of whose trimmed text lines
/// matches `pattern`, together with that line.
#[must_use]
pub fn find_by_text<'a>(nodes: &[NodeRef<'a>], pattern: &Regex) -> Option<(NodeRef<'a>, String)> {
    nodes.iter().find_map(|node| {
        node.text()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .find(|line| pattern.is_match(line))
            .map(|line| (*node, line.to_string()))
    })
}

/// Longest meaningful text found in `root` or any descendant.
///
/// Subtrees rooted at icon, button, script or style elements contribute
/// nothing, and strings made only of separator punctuation are ignored. Ties
/// keep the first candidate in document order.
#[must_use]
pub fn meaningful_text(root: &NodeRef) -> String {
    let mut best = String::new();
    let mut best_len = 0;
    walk_elements(root, &mut |node| {
        if is_non_text(node) {
            return false;
        }
        let text = visible_text(node);
        let text = text.trim();
        let len = text.chars().count();
        if len > best_len && !is_separator_only(text) {
            best = text.to_string();
            best_len = len;
        }
        true
    });
    best
}

fn is_non_text(node: &NodeRef) -> bool {
    node_tag(node).is_some_and(|t| NON_TEXT_TAGS.contains(&t.as_str()))
}

/// Text of a node without the text of its non-text descendants.
fn visible_text(node: &NodeRef) -> String {
    let mut out = String::new();
    for child in node.children() {
        if child.is_text() {
            out.push_str(&child.text());
        } else if child.is_element() && !is_non_text(&child) {
            out.push_str(&visible_text(&child));
        }
    }
    out
}

/// Pre-order walk over `root` and its descendant elements. Returning `false`
/// from `visit` skips the node's subtree.
fn walk_elements<'a>(root: &NodeRef<'a>, visit: &mut impl FnMut(&NodeRef<'a>) -> bool) {
    if root.is_element() && !visit(root) {
        return;
    }
    for child in root.children() {
        if child.is_element() {
            walk_elements(&child, visit);
        }
    }
}
