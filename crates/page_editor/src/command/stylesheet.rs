use serde::{Deserialize, Serialize};

use super::Reversible;
use crate::workspace::{ViewEvent, Workspace};

/// Re-parse the whole stylesheet from text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceStylesheet {
    pub old_css: String,
    pub new_css: String,
}

impl ReplaceStylesheet {
    pub fn new(old_css: &str, new_css: &str) -> Self {
        Self {
            old_css: old_css.to_owned(),
            new_css: new_css.to_owned(),
        }
    }
}

fn apply(workspace: &mut Workspace, text: &str) {
    workspace.stylesheet.parse(text);
    // Mirrors get the text as typed, not the regenerated form.
    workspace.emit(ViewEvent::StylesheetSource {
        text: text.to_owned(),
    });
    workspace.refresh_styles();
}

impl Reversible for ReplaceStylesheet {
    fn execute(&mut self, workspace: &mut Workspace) -> bool {
        apply(workspace, &self.new_css);
        true
    }

    fn undo(&mut self, workspace: &mut Workspace) {
        apply(workspace, &self.old_css);
    }

    fn describe(&self) -> String {
        String::from("Edit stylesheet")
    }
}
