use core::mem::take;

use html::NodeId;
use serde::{Deserialize, Serialize};

use super::Reversible;
use crate::snapshot::BaselineEntry;
use crate::workspace::{ViewEvent, Workspace};

/// Parse `markup` as detached nodes destined for `parent`.
fn parse_nodes(workspace: &mut Workspace, parent: NodeId, markup: &str) -> Option<Vec<NodeId>> {
    match workspace.document.parse_fragment_for(parent, markup) {
        Ok(nodes) => Some(nodes),
        Err(err) => {
            log::warn!("stored markup failed to parse: {err}");
            None
        }
    }
}

fn discard(workspace: &mut Workspace, nodes: &[NodeId]) {
    for &node in nodes {
        workspace.document.remove(node);
    }
}

/// Take an element out of the page together with its note and trailing
/// whitespace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveElement {
    pub element_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Element that followed the removed one, used to find the position
    /// again.
    #[serde(default)]
    pub next_sibling_id: Option<String>,
    /// Markup of everything removed.
    #[serde(default)]
    pub markup: String,
}

impl RemoveElement {
    pub fn new(element_id: &str) -> Self {
        Self {
            element_id: element_id.to_owned(),
            parent_id: None,
            next_sibling_id: None,
            markup: String::new(),
        }
    }
}

impl Reversible for RemoveElement {
    fn execute(&mut self, workspace: &mut Workspace) -> bool {
        let Some(node) = workspace.find_editable(&self.element_id) else {
            log::debug!("remove skipped: {} not found", self.element_id);
            return false;
        };
        let Some(parent) = workspace.document.parent(node) else {
            return false;
        };
        self.parent_id = workspace.identify(parent);
        self.next_sibling_id = workspace
            .document
            .next_element_sibling(node)
            .and_then(|next| workspace.identify(next));
        let run = workspace.sibling_run(node);
        self.markup = workspace.clean_markup(&run);
        discard(workspace, &run);
        workspace.rescan_annotations();
        workspace.emit(ViewEvent::OverlaysMoved);
        true
    }

    fn undo(&mut self, workspace: &mut Workspace) {
        if self.markup.is_empty() {
            return;
        }
        let Some(parent) = self.parent_id.as_deref().and_then(|id| workspace.find(id)) else {
            log::debug!("restore skipped: parent of {} not found", self.element_id);
            return;
        };
        let Some(nodes) = parse_nodes(workspace, parent, &self.markup) else {
            return;
        };
        let anchor = workspace.anchor_before(parent, self.next_sibling_id.as_deref());
        if anchor.is_none() && self.next_sibling_id.is_some() {
            log::debug!("next sibling of {} is gone; appending", self.element_id);
        }
        if !workspace.insert_nodes(parent, &nodes, anchor) {
            discard(workspace, &nodes);
            return;
        }
        workspace.rescan_annotations();
        workspace.emit(ViewEvent::OverlaysMoved);
    }

    fn describe(&self) -> String {
        format!("Remove element {}", self.element_id)
    }
}

/// Swap an element for new markup, keeping its identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceSubtree {
    pub element_id: String,
    pub old_markup: String,
    pub new_markup: String,
    /// Markup left by the first execution, identifiers included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub produced_markup: Option<String>,
    /// Baselines of the replaced subtree, put back on undo.
    #[serde(skip)]
    displaced: Vec<(String, BaselineEntry)>,
}

impl ReplaceSubtree {
    pub fn new(element_id: &str, old_markup: &str, new_markup: &str) -> Self {
        Self {
            element_id: element_id.to_owned(),
            old_markup: old_markup.to_owned(),
            new_markup: new_markup.to_owned(),
            produced_markup: None,
            displaced: Vec::new(),
        }
    }

    /// Replace the element with the single element parsed from `markup`.
    /// Returns the baselines dropped with the old subtree, or `None` when
    /// nothing changed.
    fn swap(&self, workspace: &mut Workspace, markup: &str) -> Option<Vec<(String, BaselineEntry)>> {
        let Some(node) = workspace.find_editable(&self.element_id) else {
            log::debug!("replace skipped: {} not found", self.element_id);
            return None;
        };
        let parent = workspace.document.parent(node)?;
        let nodes = parse_nodes(workspace, parent, markup)?;
        let document = &workspace.document;
        let elements: Vec<NodeId> = nodes
            .iter()
            .copied()
            .filter(|&candidate| document.is_element(candidate))
            .collect();
        let stray_text = nodes
            .iter()
            .any(|&candidate| document.is_text(candidate) && !document.is_whitespace_text(candidate));
        let [replacement] = elements.as_slice() else {
            log::warn!(
                "replacement for {} must be exactly one element, got {}",
                self.element_id,
                elements.len()
            );
            discard(workspace, &nodes);
            return None;
        };
        let replacement = *replacement;
        if stray_text {
            log::warn!("replacement for {} has text outside its element", self.element_id);
            discard(workspace, &nodes);
            return None;
        }
        let displaced = workspace
            .snapshots
            .forget_subtree(&workspace.identity, &workspace.document, node);
        let attribute = workspace.identity.attribute().to_owned();
        workspace
            .document
            .set_attr(replacement, &attribute, &self.element_id);
        if let Err(err) = workspace.document.replace_child(node, replacement) {
            log::warn!("replace of {} failed: {err}", self.element_id);
            workspace.snapshots.restore(displaced);
            discard(workspace, &nodes);
            return None;
        }
        let leftovers: Vec<NodeId> = nodes
            .into_iter()
            .filter(|&candidate| candidate != replacement)
            .collect();
        discard(workspace, &leftovers);
        workspace
            .identity
            .assign_identifiers_to_subtree(&mut workspace.document, replacement);
        workspace
            .snapshots
            .record_subtree(&workspace.identity, &workspace.document, replacement);
        workspace.rescan_annotations();
        workspace.emit(ViewEvent::OverlaysMoved);
        Some(displaced)
    }
}

impl Reversible for ReplaceSubtree {
    fn execute(&mut self, workspace: &mut Workspace) -> bool {
        let markup = self
            .produced_markup
            .clone()
            .unwrap_or_else(|| self.new_markup.clone());
        let Some(displaced) = self.swap(workspace, &markup) else {
            return false;
        };
        self.displaced = displaced;
        if self.produced_markup.is_none()
            && let Some(node) = workspace.find(&self.element_id)
        {
            self.produced_markup = Some(workspace.clean_outer_html(node));
        }
        true
    }

    fn undo(&mut self, workspace: &mut Workspace) {
        if self.swap(workspace, &self.old_markup).is_some() {
            workspace
                .snapshots
                .restore(take(&mut self.displaced));
        }
    }

    fn describe(&self) -> String {
        format!("Replace element {}", self.element_id)
    }
}

/// Duplicate an element right after itself and select the copy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyElement {
    pub source_id: String,
    /// Identifier of the copy; known once executed.
    #[serde(default)]
    pub copy_id: Option<String>,
    /// Markup of the copy, replayed on redo.
    #[serde(default)]
    pub copy_markup: Option<String>,
}

impl CopyElement {
    pub fn new(source_id: &str) -> Self {
        Self {
            source_id: source_id.to_owned(),
            copy_id: None,
            copy_markup: None,
        }
    }

    /// A detached copy of `source` with fresh identifiers and no markers.
    fn build_copy(&self, workspace: &mut Workspace, source: NodeId) -> Option<NodeId> {
        if let Some(markup) = &self.copy_markup {
            let parent = workspace.document.parent(source)?;
            let nodes = parse_nodes(workspace, parent, markup)?;
            let copy = nodes
                .iter()
                .copied()
                .find(|&node| workspace.document.is_element(node));
            let leftovers: Vec<NodeId> = nodes
                .into_iter()
                .filter(|&node| Some(node) != copy)
                .collect();
            discard(workspace, &leftovers);
            return copy;
        }
        let copy = match workspace.document.deep_clone(source) {
            Ok(copy) => copy,
            Err(err) => {
                log::warn!("copy of {} failed: {err}", self.source_id);
                return None;
            }
        };
        let markers = workspace.config.marker_classes().map(str::to_owned);
        for element in workspace.document.descendant_elements(copy) {
            for marker in &markers {
                workspace.document.remove_class(element, marker);
            }
        }
        workspace.identity.strip_subtree(&mut workspace.document, copy);
        workspace
            .identity
            .assign_identifiers_to_subtree(&mut workspace.document, copy);
        Some(copy)
    }
}

impl Reversible for CopyElement {
    fn execute(&mut self, workspace: &mut Workspace) -> bool {
        let Some(source) = workspace.find_editable(&self.source_id) else {
            log::debug!("copy skipped: {} not found", self.source_id);
            return false;
        };
        let Some(parent) = workspace.document.parent(source) else {
            return false;
        };
        let Some(copy) = self.build_copy(workspace, source) else {
            return false;
        };
        // Insert after the source (and its Below note), before its trailing
        // whitespace, repeating that whitespace ahead of the copy.
        let run = workspace.sibling_run(source);
        let trailing = run
            .last()
            .copied()
            .filter(|&node| node != source && workspace.document.is_whitespace_text(node));
        let anchor = match trailing {
            Some(whitespace) => Some(whitespace),
            None => run.last().and_then(|&last| workspace.document.next_sibling(last)),
        };
        let mut inserted = Vec::new();
        if let Some(whitespace) = trailing {
            let text = workspace.document.text_content(whitespace);
            inserted.push(workspace.document.create_text(&text));
        }
        inserted.push(copy);
        if !workspace.insert_nodes(parent, &inserted, anchor) {
            discard(workspace, &inserted);
            return false;
        }
        workspace
            .snapshots
            .record_subtree(&workspace.identity, &workspace.document, copy);
        self.copy_id = workspace.identifier_of(copy);
        if self.copy_markup.is_none() {
            self.copy_markup = Some(workspace.clean_outer_html(copy));
        }
        workspace.rescan_annotations();
        workspace.select(copy);
        workspace.emit(ViewEvent::OverlaysMoved);
        true
    }

    fn undo(&mut self, workspace: &mut Workspace) {
        let Some(copy) = self.copy_id.as_deref().and_then(|id| workspace.find(id)) else {
            log::debug!("copy of {} not found for undo", self.source_id);
            return;
        };
        if workspace.selection() == self.copy_id.as_deref() {
            workspace.deselect();
        }
        if let Some(whitespace) = workspace
            .document
            .previous_sibling(copy)
            .filter(|&node| workspace.document.is_whitespace_text(node))
        {
            workspace.document.remove(whitespace);
        }
        workspace
            .snapshots
            .discard_subtree(&workspace.identity, &workspace.document, copy);
        workspace.document.remove(copy);
        workspace.rescan_annotations();
        if let Some(source) = workspace.find(&self.source_id) {
            workspace.select(source);
        }
        workspace.emit(ViewEvent::OverlaysMoved);
    }

    fn describe(&self) -> String {
        format!("Copy element {}", self.source_id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// Swap an element with its neighbouring element, notes included.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveElement {
    pub element_id: String,
    pub direction: MoveDirection,
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Element that followed before the move.
    #[serde(default)]
    pub original_next_id: Option<String>,
    #[serde(default)]
    pub moved: bool,
}

impl MoveElement {
    pub fn new(element_id: &str, direction: MoveDirection) -> Self {
        Self {
            element_id: element_id.to_owned(),
            direction,
            parent_id: None,
            original_next_id: None,
            moved: false,
        }
    }
}

impl Reversible for MoveElement {
    fn execute(&mut self, workspace: &mut Workspace) -> bool {
        self.moved = false;
        let Some(node) = workspace.find_editable(&self.element_id) else {
            log::debug!("move skipped: {} not found", self.element_id);
            return false;
        };
        let Some(parent) = workspace.document.parent(node) else {
            return false;
        };
        let anchor = match self.direction {
            MoveDirection::Up => {
                let Some(previous) = workspace.document.previous_element_sibling(node) else {
                    return false;
                };
                Some(workspace.run_start(previous))
            }
            MoveDirection::Down => {
                let Some(next) = workspace.document.next_element_sibling(node) else {
                    return false;
                };
                workspace
                    .sibling_run(next)
                    .last()
                    .and_then(|&last| workspace.document.next_sibling(last))
            }
        };
        self.parent_id = workspace.identify(parent);
        self.original_next_id = workspace
            .document
            .next_element_sibling(node)
            .and_then(|next| workspace.identify(next));
        let run = workspace.sibling_run(node);
        if !workspace.insert_nodes(parent, &run, anchor) {
            return false;
        }
        self.moved = true;
        workspace.rescan_annotations();
        workspace.select(node);
        workspace.emit(ViewEvent::OverlaysMoved);
        true
    }

    fn undo(&mut self, workspace: &mut Workspace) {
        if !self.moved {
            return;
        }
        let Some(node) = workspace.find(&self.element_id) else {
            log::debug!("move undo skipped: {} not found", self.element_id);
            return;
        };
        let Some(parent) = self
            .parent_id
            .as_deref()
            .and_then(|id| workspace.find(id))
            .or_else(|| workspace.document.parent(node))
        else {
            return;
        };
        let anchor = workspace.anchor_before(parent, self.original_next_id.as_deref());
        let run = workspace.sibling_run(node);
        if !workspace.insert_nodes(parent, &run, anchor) {
            return;
        }
        workspace.rescan_annotations();
        workspace.select(node);
        workspace.emit(ViewEvent::OverlaysMoved);
    }

    fn describe(&self) -> String {
        let direction = match self.direction {
            MoveDirection::Up => "up",
            MoveDirection::Down => "down",
        };
        format!("Move element {} {direction}", self.element_id)
    }
}
