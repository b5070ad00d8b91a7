//! Arena-backed document tree: node kinds, navigation, attributes and text.

mod adapter;
mod printing;
mod updating;

use indextree::{Arena, NodeId};
use smallvec::SmallVec;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NodeKind {
    #[default]
    Document,
    Element {
        tag: String,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomNode {
    pub kind: NodeKind,
    /// Attributes in source order.
    pub attrs: SmallVec<(String, String), 4>,
}

impl DomNode {
    pub fn element(tag: &str) -> Self {
        Self {
            kind: NodeKind::Element {
                tag: tag.to_ascii_lowercase(),
            },
            attrs: SmallVec::new(),
        }
    }

    pub fn text(text: &str) -> Self {
        Self {
            kind: NodeKind::Text {
                text: text.to_owned(),
            },
            attrs: SmallVec::new(),
        }
    }

    pub fn comment(text: &str) -> Self {
        Self {
            kind: NodeKind::Comment {
                text: text.to_owned(),
            },
            attrs: SmallVec::new(),
        }
    }
}

/// A parsed HTML document. Node handles stay valid until the node is
/// removed; detached nodes remain in the arena and can be reinserted.
pub struct Document {
    arena: Arena<DomNode>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document containing only the document node.
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(DomNode::default());
        Self { arena, root }
    }

    #[inline]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Node data, or `None` for removed or unknown handles.
    pub fn node(&self, id: NodeId) -> Option<&DomNode> {
        self.arena
            .get(id)
            .filter(|node| !node.is_removed())
            .map(indextree::Node::get)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut DomNode> {
        self.arena
            .get_mut(id)
            .filter(|node| !node.is_removed())
            .map(indextree::Node::get_mut)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|node| &node.kind)
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { tag } => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.tag_name(id).is_some()
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Text { .. }))
    }

    /// True for text nodes that contain only whitespace.
    pub fn is_whitespace_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Text { text }) if text.trim().is_empty())
    }

    pub fn comment_text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Comment { text } => Some(text.as_str()),
            _ => None,
        }
    }

    /// The `<html>` element.
    pub fn document_element(&self) -> Option<NodeId> {
        self.element_children(self.root).into_iter().next()
    }

    fn child_of_document_element(&self, tag: &str) -> Option<NodeId> {
        let html = self.document_element()?;
        self.element_children(html)
            .into_iter()
            .find(|&child| self.tag_name(child) == Some(tag))
    }

    pub fn head(&self) -> Option<NodeId> {
        self.child_of_document_element("head")
    }

    pub fn body(&self) -> Option<NodeId> {
        self.child_of_document_element("body")
    }

    // -----------------------
    // Navigation
    // -----------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id)?.parent()
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        if self.node(id).is_none() {
            return Vec::new();
        }
        id.children(&self.arena).collect()
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .into_iter()
            .filter(|&child| self.is_element(child))
            .collect()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id)?.next_sibling()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id)?.previous_sibling()
    }

    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.next_sibling(id);
        while let Some(sibling) = current {
            if self.is_element(sibling) {
                return Some(sibling);
            }
            current = self.next_sibling(sibling);
        }
        None
    }

    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.previous_sibling(id);
        while let Some(sibling) = current {
            if self.is_element(sibling) {
                return Some(sibling);
            }
            current = self.previous_sibling(sibling);
        }
        None
    }

    /// `id` and everything below it, in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        if self.node(id).is_none() {
            return Vec::new();
        }
        id.descendants(&self.arena).collect()
    }

    /// Elements in the subtree rooted at `id` (including `id`), in document order.
    pub fn descendant_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&node| self.is_element(node))
            .collect()
    }

    /// True if `node` is `ancestor` or lies below it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        if self.node(node).is_none() {
            return false;
        }
        node.ancestors(&self.arena).any(|candidate| candidate == ancestor)
    }

    /// True if the node is reachable from the document node.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.root, id)
    }

    // -----------------------
    // Attributes and classes
    // -----------------------

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id)?
            .attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attrs(&self, id: NodeId) -> &[(String, String)] {
        self.node(id)
            .map(|node| node.attrs.as_slice())
            .unwrap_or_default()
    }

    /// Set an attribute, keeping its position if it already exists.
    /// Returns false if `id` is not an element.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        if !self.is_element(id) {
            return false;
        }
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        if let Some(slot) = node.attrs.iter_mut().find(|(key, _)| key == name) {
            value.clone_into(&mut slot.1);
        } else {
            node.attrs.push((name.to_owned(), value.to_owned()));
        }
        true
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        let node = self.node_mut(id)?;
        let index = node.attrs.iter().position(|(key, _)| key == name)?;
        Some(node.attrs.remove(index).1)
    }

    /// The raw `class` attribute, empty if absent.
    pub fn class_name(&self, id: NodeId) -> &str {
        self.attr(id, "class").unwrap_or_default()
    }

    /// Class tokens in attribute order.
    pub fn classes(&self, id: NodeId) -> Vec<&str> {
        self.class_name(id).split_ascii_whitespace().collect()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.class_name(id)
            .split_ascii_whitespace()
            .any(|token| token == class)
    }

    /// Append a class token if it is not already present.
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if class.is_empty() || self.has_class(id, class) {
            return;
        }
        let mut tokens = self.classes(id).join(" ");
        if !tokens.is_empty() {
            tokens.push(' ');
        }
        tokens.push_str(class);
        self.set_attr(id, "class", &tokens);
    }

    /// Remove every occurrence of a class token. The attribute is dropped
    /// once no tokens remain.
    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if !self.has_class(id, class) {
            return;
        }
        let remaining: Vec<&str> = self
            .classes(id)
            .into_iter()
            .filter(|token| *token != class)
            .collect();
        let joined = remaining.join(" ");
        if joined.is_empty() {
            self.remove_attr(id, "class");
        } else {
            self.set_attr(id, "class", &joined);
        }
    }

    // -----------------------
    // Text
    // -----------------------

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        match self.kind(id) {
            Some(NodeKind::Text { text } | NodeKind::Comment { text }) => text.clone(),
            Some(_) => self
                .descendants(id)
                .into_iter()
                .filter_map(|node| match self.kind(node) {
                    Some(NodeKind::Text { text }) => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
            None => String::new(),
        }
    }

    /// Overwrite a text or comment node's data.
    pub fn set_node_text(&mut self, id: NodeId, value: &str) -> bool {
        match self.node_mut(id).map(|node| &mut node.kind) {
            Some(NodeKind::Text { text } | NodeKind::Comment { text }) => {
                value.clone_into(text);
                true
            }
            _ => false,
        }
    }

    // -----------------------
    // Node creation
    // -----------------------

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.arena.new_node(DomNode::element(tag))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.arena.new_node(DomNode::text(text))
    }

    /// Create a detached comment node.
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.arena.new_node(DomNode::comment(text))
    }

    pub(crate) fn create_node(&mut self, data: DomNode) -> NodeId {
        self.arena.new_node(data)
    }
}

#[cfg(test)]
mod tests {
    use super::Document;

    #[test]
    fn class_tokens_round_trip() {
        let mut doc = Document::new();
        let div = doc.create_element("DIV");
        assert_eq!(doc.tag_name(div), Some("div"));
        doc.add_class(div, "card");
        doc.add_class(div, "Wide");
        doc.add_class(div, "card");
        assert_eq!(doc.class_name(div), "card Wide");
        doc.remove_class(div, "card");
        assert_eq!(doc.classes(div), vec!["Wide"]);
        doc.remove_class(div, "Wide");
        assert_eq!(doc.attr(div, "class"), None);
    }

    #[test]
    fn attributes_keep_their_position() {
        let mut doc = Document::new();
        let link = doc.create_element("a");
        doc.set_attr(link, "href", "/a");
        doc.set_attr(link, "title", "t");
        doc.set_attr(link, "href", "/b");
        assert_eq!(doc.outer_html(link), "<a href=\"/b\" title=\"t\"></a>");
        assert_eq!(doc.remove_attr(link, "href").as_deref(), Some("/b"));
        assert_eq!(doc.remove_attr(link, "href"), None);
    }

    #[test]
    fn navigation_skips_text_nodes() {
        let doc = Document::parse("<ul> <li>a</li> text <li>b</li> </ul>").unwrap();
        let list = doc.element_children(doc.body().unwrap())[0];
        let items = doc.element_children(list);
        assert_eq!(doc.next_element_sibling(items[0]), Some(items[1]));
        assert_eq!(doc.previous_element_sibling(items[1]), Some(items[0]));
        assert!(doc.is_whitespace_text(doc.children(list)[0]));
        assert_eq!(doc.text_content(list), " a text b ");
        assert!(doc.contains(list, items[1]));
        assert!(doc.is_connected(items[1]));
    }
}
