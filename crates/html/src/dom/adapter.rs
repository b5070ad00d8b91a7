//! Selector matching over the document tree.

use super::{Document, NodeKind};
use css_selectors::ElementAdapter;
use indextree::NodeId;

impl ElementAdapter for Document {
    type Handle = NodeId;

    fn parent(&self, element: NodeId) -> Option<NodeId> {
        Self::parent(self, element).filter(|&parent| self.is_element(parent))
    }

    fn previous_sibling_element(&self, element: NodeId) -> Option<NodeId> {
        self.previous_element_sibling(element)
    }

    fn next_sibling_element(&self, element: NodeId) -> Option<NodeId> {
        self.next_element_sibling(element)
    }

    fn tag_name(&self, element: NodeId) -> &str {
        Self::tag_name(self, element).unwrap_or_default()
    }

    fn element_id(&self, element: NodeId) -> Option<&str> {
        self.attr(element, "id")
    }

    fn has_class(&self, element: NodeId, class: &str) -> bool {
        Self::has_class(self, element, class)
    }

    fn attr(&self, element: NodeId, name: &str) -> Option<&str> {
        Self::attr(self, element, name)
    }

    fn is_empty(&self, element: NodeId) -> bool {
        self.children(element).into_iter().all(|child| {
            matches!(self.kind(child), Some(NodeKind::Comment { .. }))
                || matches!(self.kind(child), Some(NodeKind::Text { text }) if text.is_empty())
        })
    }
}
