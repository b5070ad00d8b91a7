//! Session state that commands operate on: the document, its stylesheet
//! and script, plus the editor's own bookkeeping (identifiers, baselines,
//! notes, selection, preview) and the events the view drains.

use core::mem::take;

use anyhow::{Result, anyhow};
use css::{RuleMatch, StylesheetModel};
use html::{Document, NodeId};
use serde::Serialize;

use crate::annotations::{AnnotationIndex, format_note};
use crate::config::EditorConfig;
use crate::identity::IdentityAssignor;
use crate::snapshot::{BaselineChange, SnapshotStore};

/// What the view has to redraw after a change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ViewEvent {
    /// Composed stylesheet for the preview surface.
    StylesChanged { css: String },
    /// Exact text for a stylesheet editor mirror.
    StylesheetSource { text: String },
    /// Exact text for a script editor mirror.
    ScriptSource { text: String },
    SelectionChanged { identifier: Option<String> },
    /// Structure changed; overlay icons need repositioning.
    OverlaysMoved,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScriptState {
    pub text: String,
    /// Whether the script ran since it was last changed.
    pub has_run: bool,
}

#[derive(Clone, Debug)]
struct PreviewState {
    markup: String,
    reselect: Option<String>,
}

pub struct Workspace {
    pub(crate) config: EditorConfig,
    pub(crate) document: Document,
    pub(crate) stylesheet: StylesheetModel,
    pub(crate) identity: IdentityAssignor,
    pub(crate) snapshots: SnapshotStore,
    pub(crate) annotations: AnnotationIndex,
    pub(crate) script: ScriptState,
    selection: Option<String>,
    preview: Option<PreviewState>,
    events: Vec<ViewEvent>,
}

impl Workspace {
    pub fn new(config: EditorConfig) -> Self {
        let identity = IdentityAssignor::new(&config.identity_attribute, &config.identity_prefix);
        let snapshots = SnapshotStore::new(&config.marker_classes());
        let annotations = AnnotationIndex::new(&config.note_marker);
        Self {
            config,
            document: Document::new(),
            stylesheet: StylesheetModel::new(),
            identity,
            snapshots,
            annotations,
            script: ScriptState::default(),
            selection: None,
            preview: None,
            events: Vec::new(),
        }
    }

    /// Replace everything with a new page. Identifier numbering restarts
    /// and the baseline is taken from the loaded markup.
    ///
    /// # Errors
    /// Returns an error if the markup cannot be parsed.
    pub fn load(&mut self, markup: &str, css: &str, script: &str) -> Result<()> {
        let mut document = Document::parse(markup)?;
        let body = document
            .body()
            .ok_or_else(|| anyhow!("document has no body"))?;
        self.identity.reset();
        self.identity.observe_existing(&document, body);
        self.identity.assign_identifiers_to_subtree(&mut document, body);
        self.document = document;
        self.snapshots
            .rebuild_from_document(&self.identity, &self.document, body);
        self.annotations.scan(&self.identity, &self.document, body);
        self.stylesheet.parse(css);
        self.script = ScriptState {
            text: script.to_owned(),
            has_run: false,
        };
        self.selection = None;
        self.preview = None;
        self.events.clear();
        log::debug!(
            "loaded page: {} baselines, {} rules, {} notes",
            self.snapshots.len(),
            self.stylesheet.rules().len(),
            self.annotations.len()
        );
        self.emit(ViewEvent::StylesheetSource {
            text: css.to_owned(),
        });
        self.emit(ViewEvent::ScriptSource {
            text: script.to_owned(),
        });
        self.emit(ViewEvent::SelectionChanged { identifier: None });
        self.refresh_styles();
        Ok(())
    }

    // -----------------------
    // Read access
    // -----------------------

    #[inline]
    pub const fn config(&self) -> &EditorConfig {
        &self.config
    }

    #[inline]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    #[inline]
    pub const fn stylesheet(&self) -> &StylesheetModel {
        &self.stylesheet
    }

    #[inline]
    pub const fn identity(&self) -> &IdentityAssignor {
        &self.identity
    }

    #[inline]
    pub const fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    #[inline]
    pub const fn annotations(&self) -> &AnnotationIndex {
        &self.annotations
    }

    #[inline]
    pub const fn script(&self) -> &ScriptState {
        &self.script
    }

    /// The editable root.
    pub fn body(&self) -> Option<NodeId> {
        self.document.body()
    }

    /// Resolve an identifier inside the editable root.
    pub fn find(&self, identifier: &str) -> Option<NodeId> {
        let body = self.body()?;
        self.identity.find(&self.document, body, identifier)
    }

    /// Resolve an identifier to an element strictly below the editable
    /// root. Structural commands use this so the root itself is never moved,
    /// copied, replaced or removed.
    pub fn find_editable(&self, identifier: &str) -> Option<NodeId> {
        let node = self.find(identifier)?;
        (Some(node) != self.body()).then_some(node)
    }

    pub fn identifier_of(&self, node: NodeId) -> Option<String> {
        self.identity
            .identifier_of(&self.document, node)
            .map(str::to_owned)
    }

    /// The node's identifier, allocating one (and recording its baseline)
    /// if the element has none yet.
    pub fn identify(&mut self, node: NodeId) -> Option<String> {
        if self
            .identity
            .ensure_identifier(&mut self.document, node)
            .is_some()
        {
            self.snapshots.record(&self.identity, &self.document, node);
        }
        self.identifier_of(node)
    }

    // -----------------------
    // Markup capture
    // -----------------------

    /// Outer markup without editor marker classes.
    pub fn clean_outer_html(&self, node: NodeId) -> String {
        self.document
            .outer_html_excluding_classes(node, &self.config.marker_classes())
    }

    /// Inner markup without editor marker classes.
    pub fn clean_inner_html(&self, node: NodeId) -> String {
        self.document
            .inner_html_excluding_classes(node, &self.config.marker_classes())
    }

    pub fn clean_markup(&self, nodes: &[NodeId]) -> String {
        nodes
            .iter()
            .map(|&node| self.clean_outer_html(node))
            .collect()
    }

    /// The page content as it would be exported.
    pub fn page_markup(&self) -> String {
        self.body()
            .map(|body| self.clean_inner_html(body))
            .unwrap_or_default()
    }

    pub fn baseline_changes(&self) -> Vec<BaselineChange> {
        self.body()
            .map(|body| self.snapshots.changes(&self.identity, &self.document, body))
            .unwrap_or_default()
    }

    // -----------------------
    // Structure helpers
    // -----------------------

    pub fn rescan_annotations(&mut self) {
        if let Some(body) = self.body() {
            self.annotations.scan(&self.identity, &self.document, body);
        }
    }

    pub fn sibling_run(&self, element: NodeId) -> Vec<NodeId> {
        self.annotations
            .sibling_run(&self.identity, &self.document, element)
    }

    pub fn run_start(&self, element: NodeId) -> NodeId {
        self.annotations
            .run_start(&self.identity, &self.document, element)
    }

    /// Where to reinsert under `parent`: the start of the run of the element
    /// named `identifier`, or the end of `parent` if that element is gone or
    /// has moved elsewhere.
    pub(crate) fn anchor_before(&self, parent: NodeId, identifier: Option<&str>) -> Option<NodeId> {
        let element = self.find(identifier?)?;
        if self.document.parent(element) != Some(parent) {
            return None;
        }
        Some(self.run_start(element))
    }

    /// Insert `nodes` in order before `anchor` (or at the end of `parent`).
    pub(crate) fn insert_nodes(
        &mut self,
        parent: NodeId,
        nodes: &[NodeId],
        anchor: Option<NodeId>,
    ) -> bool {
        for &node in nodes {
            if let Err(err) = self.document.insert_before(parent, node, anchor) {
                log::warn!("failed to insert node: {err}");
                return false;
            }
        }
        true
    }

    // -----------------------
    // Selection and hover
    // -----------------------

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn selected_node(&self) -> Option<NodeId> {
        self.find(self.selection.as_deref()?)
    }

    /// Select an element below the editable root. Ignored while previewing.
    pub fn select(&mut self, node: NodeId) -> bool {
        if self.preview.is_some() {
            log::debug!("selection ignored during preview");
            return false;
        }
        let Some(body) = self.body() else {
            return false;
        };
        if node == body || !self.document.is_element(node) || !self.document.contains(body, node)
        {
            return false;
        }
        let Some(identifier) = self.identify(node) else {
            return false;
        };
        if self.selection.as_deref() != Some(identifier.as_str()) {
            self.clear_selection_markers();
            self.selection = Some(identifier.clone());
            self.emit(ViewEvent::SelectionChanged {
                identifier: Some(identifier),
            });
        }
        self.document.add_class(node, &self.config.selected_class);
        true
    }

    pub fn select_identifier(&mut self, identifier: &str) -> bool {
        self.find(identifier)
            .is_some_and(|node| self.select(node))
    }

    pub fn deselect(&mut self) {
        if self.selection.is_none() {
            return;
        }
        self.clear_selection_markers();
        self.selection = None;
        self.emit(ViewEvent::SelectionChanged { identifier: None });
    }

    fn clear_selection_markers(&mut self) {
        if let Some(node) = self.selected_node() {
            self.document.remove_class(node, &self.config.selected_class);
            self.document.remove_class(node, &self.config.hover_class);
        }
    }

    /// Bring the selection marker in line with the tree after an edit: put
    /// the class back on the selected element, or drop a selection whose
    /// element no longer exists.
    pub fn sync_selection(&mut self) {
        let Some(identifier) = self.selection.clone() else {
            return;
        };
        match self.find(&identifier) {
            Some(node) => self.document.add_class(node, &self.config.selected_class),
            None => {
                log::debug!("selected element {identifier} is gone");
                self.selection = None;
                self.emit(ViewEvent::SelectionChanged { identifier: None });
            }
        }
    }

    /// Flip hover simulation on the selected element. Returns the new state.
    pub fn toggle_hover(&mut self) -> bool {
        let Some(node) = self.selected_node() else {
            return false;
        };
        let hover = self.config.hover_class.clone();
        let enabled = !self.document.has_class(node, &hover);
        if enabled {
            self.document.add_class(node, &hover);
        } else {
            self.document.remove_class(node, &hover);
        }
        enabled
    }

    pub fn is_hover_simulated(&self) -> bool {
        self.selected_node()
            .is_some_and(|node| self.document.has_class(node, &self.config.hover_class))
    }

    /// Short label for the selection: `#id`, else `tag.class…`, else `tag`.
    pub fn selector_label(&self) -> Option<String> {
        let node = self.selected_node()?;
        if let Some(id) = self.document.attr(node, "id").filter(|id| !id.is_empty()) {
            return Some(format!("#{id}"));
        }
        let tag = self.document.tag_name(node)?;
        let markers = self.config.marker_classes();
        let classes: Vec<&str> = self
            .document
            .classes(node)
            .into_iter()
            .filter(|class| !markers.contains(class))
            .collect();
        if classes.is_empty() {
            Some(tag.to_owned())
        } else {
            Some(format!("{tag}.{}", classes.join(".")))
        }
    }

    /// Rules applying to the selection, simulating `:hover` when the hover
    /// marker is on.
    pub fn matching_rules(&self) -> Vec<RuleMatch> {
        let Some(node) = self.selected_node() else {
            return Vec::new();
        };
        self.stylesheet
            .match_rules(&self.document, node, self.is_hover_simulated())
    }

    // -----------------------
    // Styles and events
    // -----------------------

    /// Recompose the preview stylesheet after a rule change.
    pub fn refresh_styles(&mut self) {
        let css = if self.preview.is_some() {
            self.stylesheet.generate()
        } else {
            self.stylesheet
                .preview_text(&self.config.chrome_css(), &self.config.hover_class)
        };
        self.emit(ViewEvent::StylesChanged { css });
    }

    pub(crate) fn emit(&mut self, event: ViewEvent) {
        log::trace!("view event {event:?}");
        self.events.push(event);
    }

    /// Take the events queued since the last call.
    pub fn drain_events(&mut self) -> Vec<ViewEvent> {
        take(&mut self.events)
    }

    // -----------------------
    // Preview mode
    // -----------------------

    #[inline]
    pub const fn is_previewing(&self) -> bool {
        self.preview.is_some()
    }

    /// Show the page without editor chrome. The body markup is kept so
    /// leaving preview discards whatever the running page did to it.
    pub fn enter_preview(&mut self) -> bool {
        if self.preview.is_some() {
            return false;
        }
        let Some(body) = self.body() else {
            return false;
        };
        let reselect = self.selection.clone();
        self.deselect();
        let markers = self.config.marker_classes().map(str::to_owned);
        for element in self.document.descendant_elements(body) {
            for marker in &markers {
                self.document.remove_class(element, marker);
            }
        }
        let markup = self.document.inner_html(body);
        self.script.has_run = true;
        self.preview = Some(PreviewState { markup, reselect });
        self.refresh_styles();
        true
    }

    pub fn exit_preview(&mut self) -> bool {
        let Some(state) = self.preview.take() else {
            return false;
        };
        if let Some(body) = self.body()
            && let Err(err) = self.document.set_inner_html(body, &state.markup)
        {
            log::warn!("failed to restore markup after preview: {err}");
        }
        self.rescan_annotations();
        self.refresh_styles();
        if let Some(identifier) = state.reselect {
            self.select_identifier(&identifier);
        }
        self.emit(ViewEvent::OverlaysMoved);
        true
    }

    // -----------------------
    // Notes
    // -----------------------

    pub fn note_text(&self, identifier: &str) -> Option<String> {
        self.annotations.note_text(&self.document, identifier)
    }

    /// Attach, edit or (with blank text) delete the note of an element.
    /// Notes are part of the page markup but are not recorded in history.
    pub fn set_note(&mut self, identifier: &str, text: &str) -> bool {
        let Some(node) = self.find(identifier) else {
            log::debug!("no element {identifier} to annotate");
            return false;
        };
        let comment_text = format_note(self.annotations.marker(), text);
        match self.annotations.get(identifier) {
            Some(annotation) if text.trim().is_empty() => self.document.remove(annotation.comment),
            Some(annotation) => {
                self.document.set_node_text(annotation.comment, &comment_text);
            }
            None if text.trim().is_empty() => return false,
            None => {
                let Some(parent) = self.document.parent(node) else {
                    return false;
                };
                let comment = self.document.create_comment(&comment_text);
                if !self.insert_nodes(parent, &[comment], Some(node)) {
                    return false;
                }
            }
        }
        self.rescan_annotations();
        self.emit(ViewEvent::OverlaysMoved);
        true
    }
}
