use serde::{Deserialize, Serialize};

use super::Reversible;
use crate::workspace::{ViewEvent, Workspace};

/// Replace the whole page body. Both directions establish a new baseline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceDocument {
    pub old_markup: String,
    pub new_markup: String,
    /// Body markup left by the first execution, identifiers included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub produced_markup: Option<String>,
}

impl ReplaceDocument {
    pub fn new(old_markup: &str, new_markup: &str) -> Self {
        Self {
            old_markup: old_markup.to_owned(),
            new_markup: new_markup.to_owned(),
            produced_markup: None,
        }
    }
}

fn apply(workspace: &mut Workspace, markup: &str) -> bool {
    let Some(body) = workspace.body() else {
        return false;
    };
    workspace.deselect();
    if let Err(err) = workspace.document.set_inner_html(body, markup) {
        log::warn!("document replace failed: {err}");
        return false;
    }
    workspace.identity.observe_existing(&workspace.document, body);
    workspace
        .identity
        .assign_identifiers_to_subtree(&mut workspace.document, body);
    workspace.rescan_annotations();
    workspace
        .snapshots
        .rebuild_from_document(&workspace.identity, &workspace.document, body);
    workspace.emit(ViewEvent::OverlaysMoved);
    true
}

impl Reversible for ReplaceDocument {
    fn execute(&mut self, workspace: &mut Workspace) -> bool {
        let markup = self
            .produced_markup
            .clone()
            .unwrap_or_else(|| self.new_markup.clone());
        if !apply(workspace, &markup) {
            return false;
        }
        if self.produced_markup.is_none() {
            self.produced_markup = Some(workspace.page_markup());
        }
        true
    }

    fn undo(&mut self, workspace: &mut Workspace) {
        apply(workspace, &self.old_markup);
    }

    fn describe(&self) -> String {
        String::from("Replace page")
    }
}
