//! Baseline appearance of identified elements.
//!
//! A baseline is an element's class list and inline style as of the last
//! reset point (document load or whole-document replace). Export compares
//! the live document against it.

use std::collections::BTreeMap;

use html::{Document, NodeId};
use serde::{Deserialize, Serialize};

use crate::identity::IdentityAssignor;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineEntry {
    pub class_list: String,
    pub inline_style_text: String,
}

/// An element whose appearance differs from its baseline, or that has none.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineChange {
    pub identifier: String,
    pub baseline: Option<BaselineEntry>,
    pub current: BaselineEntry,
}

#[derive(Clone, Debug, Default)]
pub struct SnapshotStore {
    entries: BTreeMap<String, BaselineEntry>,
    /// Transient marker classes never recorded in a baseline.
    excluded_classes: Vec<String>,
}

impl SnapshotStore {
    pub fn new(excluded_classes: &[&str]) -> Self {
        Self {
            entries: BTreeMap::new(),
            excluded_classes: excluded_classes.iter().map(|&class| class.to_owned()).collect(),
        }
    }

    /// The element's appearance right now, marker classes removed.
    pub fn current_entry(&self, document: &Document, node: NodeId) -> BaselineEntry {
        let class_list = document
            .classes(node)
            .into_iter()
            .filter(|class| !self.excluded_classes.iter().any(|excluded| excluded == class))
            .collect::<Vec<_>>()
            .join(" ");
        BaselineEntry {
            class_list,
            inline_style_text: document.attr(node, "style").unwrap_or_default().to_owned(),
        }
    }

    /// Record one element, if it is identified.
    pub fn record(&mut self, identity: &IdentityAssignor, document: &Document, node: NodeId) {
        if let Some(identifier) = identity.identifier_of(document, node) {
            let entry = self.current_entry(document, node);
            self.entries.insert(identifier.to_owned(), entry);
        }
    }

    /// Store or overwrite the baseline of every identified element in the
    /// subtree.
    pub fn record_subtree(&mut self, identity: &IdentityAssignor, document: &Document, root: NodeId) {
        for element in document.descendant_elements(root) {
            self.record(identity, document, element);
        }
    }

    /// Drop the baselines of every identified element in the subtree,
    /// returning them in document order.
    pub fn forget_subtree(
        &mut self,
        identity: &IdentityAssignor,
        document: &Document,
        root: NodeId,
    ) -> Vec<(String, BaselineEntry)> {
        document
            .descendant_elements(root)
            .into_iter()
            .filter_map(|element| {
                let identifier = identity.identifier_of(document, element)?;
                self.entries
                    .remove(identifier)
                    .map(|entry| (identifier.to_owned(), entry))
            })
            .collect()
    }

    /// Drop the baselines of every identified element in the subtree.
    pub fn discard_subtree(&mut self, identity: &IdentityAssignor, document: &Document, root: NodeId) {
        for element in document.descendant_elements(root) {
            if let Some(identifier) = identity.identifier_of(document, element) {
                self.entries.remove(identifier);
            }
        }
    }

    /// Put previously forgotten entries back.
    pub fn restore(&mut self, entries: Vec<(String, BaselineEntry)>) {
        self.entries.extend(entries);
    }

    /// Discard everything and re-derive baselines from the live tree.
    pub fn rebuild_from_document(
        &mut self,
        identity: &IdentityAssignor,
        document: &Document,
        root: NodeId,
    ) {
        self.entries.clear();
        self.record_subtree(identity, document, root);
        log::debug!("baseline rebuilt with {} entries", self.entries.len());
    }

    pub fn get(&self, identifier: &str) -> Option<&BaselineEntry> {
        self.entries.get(identifier)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identified elements under `root` whose class list or inline style
    /// differs from baseline, in document order.
    pub fn changes(
        &self,
        identity: &IdentityAssignor,
        document: &Document,
        root: NodeId,
    ) -> Vec<BaselineChange> {
        document
            .descendant_elements(root)
            .into_iter()
            .filter_map(|element| {
                let identifier = identity.identifier_of(document, element)?;
                let current = self.current_entry(document, element);
                let baseline = self.entries.get(identifier);
                (baseline != Some(&current)).then(|| BaselineChange {
                    identifier: identifier.to_owned(),
                    baseline: baseline.cloned(),
                    current,
                })
            })
            .collect()
    }
}
