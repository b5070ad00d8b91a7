//! Stable identifiers for document elements.
//!
//! Arena handles are not stable across re-parsing, so every element the
//! editor touches carries an identifier attribute. Commands refer to nodes
//! only through these identifiers and resolve them freshly when they run.

use html::{Document, NodeId};

/// Allocates identifiers from a counter that only moves forward until the
/// next document load.
#[derive(Clone, Debug)]
pub struct IdentityAssignor {
    attribute: String,
    prefix: String,
    next: u64,
}

impl IdentityAssignor {
    pub fn new(attribute: &str, prefix: &str) -> Self {
        Self {
            attribute: attribute.to_owned(),
            prefix: prefix.to_owned(),
            next: 1,
        }
    }

    #[inline]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Restart numbering for a freshly loaded document.
    pub fn reset(&mut self) {
        self.next = 1;
    }

    /// Advance the counter past identifiers already present in the markup
    /// under `root`, so allocation never collides with them.
    pub fn observe_existing(&mut self, document: &Document, root: NodeId) {
        for element in document.descendant_elements(root) {
            let Some(number) = self
                .identifier_of(document, element)
                .and_then(|id| id.strip_prefix(self.prefix.as_str()))
                .and_then(|suffix| suffix.parse::<u64>().ok())
            else {
                continue;
            };
            if number >= self.next {
                self.next = number.saturating_add(1);
            }
        }
    }

    pub fn identifier_of<'doc>(&self, document: &'doc Document, node: NodeId) -> Option<&'doc str> {
        document.attr(node, &self.attribute)
    }

    /// Tag `node` with a fresh identifier. Returns the new identifier, or
    /// `None` if the node is not an element or is already identified.
    pub fn ensure_identifier(&mut self, document: &mut Document, node: NodeId) -> Option<String> {
        if !document.is_element(node) || self.identifier_of(document, node).is_some() {
            return None;
        }
        let identifier = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        document.set_attr(node, &self.attribute, &identifier);
        Some(identifier)
    }

    /// Ensure `root` and every element below it are identified. Returns the
    /// identifiers that were newly allocated.
    pub fn assign_identifiers_to_subtree(
        &mut self,
        document: &mut Document,
        root: NodeId,
    ) -> Vec<String> {
        document
            .descendant_elements(root)
            .into_iter()
            .filter_map(|element| self.ensure_identifier(document, element))
            .collect()
    }

    /// The element under `within` (inclusive) carrying `identifier`.
    pub fn find(&self, document: &Document, within: NodeId, identifier: &str) -> Option<NodeId> {
        document
            .descendant_elements(within)
            .into_iter()
            .find(|&element| self.identifier_of(document, element) == Some(identifier))
    }

    /// Drop identifiers from `root` and its descendants.
    pub fn strip_subtree(&self, document: &mut Document, root: NodeId) {
        for element in document.descendant_elements(root) {
            document.remove_attr(element, &self.attribute);
        }
    }
}
