//! The closed set of reversible edits.
//!
//! Every command captures identifiers and text, never arena handles, and
//! resolves its targets when it runs. A target that no longer resolves
//! turns the command into a logged no-op so history stays replayable.

mod document;
mod elements;
mod rules;
mod script;
mod stylesheet;
mod text;

use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::workspace::Workspace;

pub use document::ReplaceDocument;
pub use elements::{CopyElement, MoveDirection, MoveElement, RemoveElement, ReplaceSubtree};
pub use rules::{AddRule, ChangeRule, ReconcileRules, RemoveRule, reconcile_rules};
pub use script::ChangeScript;
pub use stylesheet::ReplaceStylesheet;
pub use text::{ChangeText, TextMode};

/// Forward and inverse effect of an edit.
pub trait Reversible {
    /// Apply the edit. Called once per logical action (and again on redo).
    /// Returns false when the edit was skipped and left the workspace
    /// untouched.
    fn execute(&mut self, workspace: &mut Workspace) -> bool;

    /// Reverse the most recent `execute`.
    fn undo(&mut self, workspace: &mut Workspace);

    /// Human-readable summary for history listings.
    fn describe(&self) -> String;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Action {
    ReplaceStylesheet(ReplaceStylesheet),
    ChangeText(ChangeText),
    ChangeRule(ChangeRule),
    AddRule(AddRule),
    RemoveRule(RemoveRule),
    RemoveElement(RemoveElement),
    ReplaceSubtree(ReplaceSubtree),
    CopyElement(CopyElement),
    ReplaceDocument(ReplaceDocument),
    MoveElement(MoveElement),
    ChangeScript(ChangeScript),
    ReconcileRules(ReconcileRules),
}

macro_rules! dispatch {
    ($action:expr, $inner:ident => $body:expr) => {
        match $action {
            Action::ReplaceStylesheet($inner) => $body,
            Action::ChangeText($inner) => $body,
            Action::ChangeRule($inner) => $body,
            Action::AddRule($inner) => $body,
            Action::RemoveRule($inner) => $body,
            Action::RemoveElement($inner) => $body,
            Action::ReplaceSubtree($inner) => $body,
            Action::CopyElement($inner) => $body,
            Action::ReplaceDocument($inner) => $body,
            Action::MoveElement($inner) => $body,
            Action::ChangeScript($inner) => $body,
            Action::ReconcileRules($inner) => $body,
        }
    };
}

impl Reversible for Action {
    fn execute(&mut self, workspace: &mut Workspace) -> bool {
        dispatch!(self, inner => inner.execute(workspace))
    }

    fn undo(&mut self, workspace: &mut Workspace) {
        dispatch!(self, inner => inner.undo(workspace));
    }

    fn describe(&self) -> String {
        dispatch!(self, inner => inner.describe())
    }
}

macro_rules! impl_from {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Action {
                fn from(inner: $variant) -> Self {
                    Self::$variant(inner)
                }
            }
        )*
    };
}

impl_from!(
    ReplaceStylesheet,
    ChangeText,
    ChangeRule,
    AddRule,
    RemoveRule,
    RemoveElement,
    ReplaceSubtree,
    CopyElement,
    ReplaceDocument,
    MoveElement,
    ChangeScript,
    ReconcileRules,
);

/// A history entry: an action plus when and why it was recorded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub description: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    #[serde(flatten)]
    pub action: Action,
}

impl Command {
    pub fn new(action: impl Into<Action>) -> Self {
        let action = action.into();
        Self {
            description: action.describe(),
            timestamp: now_millis(),
            action,
        }
    }

    /// Rebuild a command from its exported record.
    ///
    /// # Errors
    /// Returns an error if `text` is not a command record.
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Run the action. False if it was skipped.
    pub fn execute(&mut self, workspace: &mut Workspace) -> bool {
        log::debug!("execute: {}", self.description);
        self.action.execute(workspace)
    }

    pub fn undo(&mut self, workspace: &mut Workspace) {
        log::debug!("undo: {}", self.description);
        self.action.undo(workspace);
    }
}

/// Rebuild an exported history list.
///
/// # Errors
/// Returns an error if `text` is not a list of command records.
pub fn history_from_json(text: &str) -> anyhow::Result<Vec<Command>> {
    Ok(serde_json::from_str(text)?)
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_carry_a_type_tag() {
        let command = Command::new(ChangeScript::new("a()", "b()"));
        let json: serde_json::Value = serde_json::from_str(&command.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "ChangeScript");
        assert_eq!(json["oldScript"], "a()");
        assert_eq!(json["description"], command.description);
        assert!(json["timestamp"].as_u64().unwrap() > 0);

        let back = Command::from_json(&command.to_json().unwrap()).unwrap();
        assert_eq!(back, command);
        assert!(Command::from_json(r#"{"type":"Nope","description":"","timestamp":0}"#).is_err());
    }
}
