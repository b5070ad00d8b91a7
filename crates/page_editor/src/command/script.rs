use serde::{Deserialize, Serialize};

use super::Reversible;
use crate::workspace::{ViewEvent, Workspace};

/// Replace the page script. The script counts as not yet run afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeScript {
    pub old_script: String,
    pub new_script: String,
}

impl ChangeScript {
    pub fn new(old_script: &str, new_script: &str) -> Self {
        Self {
            old_script: old_script.to_owned(),
            new_script: new_script.to_owned(),
        }
    }
}

fn apply(workspace: &mut Workspace, text: &str) {
    text.clone_into(&mut workspace.script.text);
    workspace.script.has_run = false;
    workspace.emit(ViewEvent::ScriptSource {
        text: text.to_owned(),
    });
}

impl Reversible for ChangeScript {
    fn execute(&mut self, workspace: &mut Workspace) -> bool {
        apply(workspace, &self.new_script);
        true
    }

    fn undo(&mut self, workspace: &mut Workspace) {
        apply(workspace, &self.old_script);
    }

    fn describe(&self) -> String {
        String::from("Edit script")
    }
}
