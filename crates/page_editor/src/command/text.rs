use core::mem::take;

use serde::{Deserialize, Serialize};

use super::Reversible;
use crate::snapshot::BaselineEntry;
use crate::workspace::{ViewEvent, Workspace};

/// How an element's content is edited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextMode {
    /// Text content.
    #[default]
    Plain,
    /// Inner markup.
    Rich,
    /// The value of a form control.
    FormValue,
}

/// Replace an element's text, inner markup or form value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeText {
    pub element_id: String,
    pub old_content: String,
    pub new_content: String,
    #[serde(default)]
    pub mode: TextMode,
    /// Inner markup left by the first rich-text execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub produced: Option<String>,
    /// Baselines of the element's subtree before a rich-text execution.
    #[serde(skip)]
    displaced: Vec<(String, BaselineEntry)>,
}

impl ChangeText {
    pub fn new(element_id: &str, old_content: &str, new_content: &str, mode: TextMode) -> Self {
        Self {
            element_id: element_id.to_owned(),
            old_content: old_content.to_owned(),
            new_content: new_content.to_owned(),
            mode,
            produced: None,
            displaced: Vec::new(),
        }
    }

    fn apply(&self, workspace: &mut Workspace, content: &str) -> bool {
        let Some(node) = workspace.find(&self.element_id) else {
            log::debug!("text change skipped: {} not found", self.element_id);
            return false;
        };
        let result = match self.mode {
            TextMode::Plain => workspace.document.set_text_content(node, content),
            TextMode::FormValue if workspace.document.tag_name(node) == Some("textarea") => {
                workspace.document.set_text_content(node, content)
            }
            TextMode::FormValue => {
                workspace.document.set_attr(node, "value", content);
                Ok(())
            }
            TextMode::Rich => workspace.document.set_inner_html(node, content),
        };
        if let Err(err) = result {
            log::warn!("text change on {} failed: {err}", self.element_id);
            return false;
        }
        if self.mode == TextMode::Rich {
            for child in workspace.document.element_children(node) {
                workspace
                    .identity
                    .assign_identifiers_to_subtree(&mut workspace.document, child);
            }
            workspace.rescan_annotations();
            workspace.emit(ViewEvent::OverlaysMoved);
        }
        true
    }
}

impl Reversible for ChangeText {
    fn execute(&mut self, workspace: &mut Workspace) -> bool {
        let content = self
            .produced
            .clone()
            .unwrap_or_else(|| self.new_content.clone());
        if self.mode != TextMode::Rich {
            return self.apply(workspace, &content);
        }
        let Some(node) = workspace.find(&self.element_id) else {
            log::debug!("text change skipped: {} not found", self.element_id);
            return false;
        };
        let displaced = workspace
            .snapshots
            .forget_subtree(&workspace.identity, &workspace.document, node);
        if !self.apply(workspace, &content) {
            workspace.snapshots.restore(displaced);
            return false;
        }
        self.displaced = displaced;
        workspace
            .snapshots
            .record_subtree(&workspace.identity, &workspace.document, node);
        if self.produced.is_none() {
            self.produced = Some(workspace.clean_inner_html(node));
        }
        true
    }

    fn undo(&mut self, workspace: &mut Workspace) {
        if self.mode != TextMode::Rich {
            self.apply(workspace, &self.old_content);
            return;
        }
        let Some(node) = workspace.find(&self.element_id) else {
            log::debug!("text undo skipped: {} not found", self.element_id);
            return;
        };
        workspace
            .snapshots
            .discard_subtree(&workspace.identity, &workspace.document, node);
        if !self.apply(workspace, &self.old_content) {
            return;
        }
        if self.displaced.is_empty() {
            // Imported records carry no displaced baselines.
            workspace
                .snapshots
                .record_subtree(&workspace.identity, &workspace.document, node);
        } else {
            workspace.snapshots.restore(take(&mut self.displaced));
        }
    }

    fn describe(&self) -> String {
        format!("Edit text of {}", self.element_id)
    }
}
