//! The editing session: one workspace plus its history.
//!
//! Every toolbar or panel action goes through here. Actions capture the
//! current state into a command and hand it to the history, so undo and
//! redo cover them.

use std::collections::BTreeSet;

use anyhow::Result;
use html::NodeId;

use crate::command::{
    Action, AddRule, ChangeRule, ChangeScript, ChangeText, Command, CopyElement, MoveDirection,
    MoveElement, RemoveElement, RemoveRule, ReplaceDocument, ReplaceStylesheet, TextMode,
    history_from_json,
};
use crate::config::EditorConfig;
use crate::history::CommandHistory;
use crate::proposal::{EditContext, EditProposal, PageProposal};
use crate::snapshot::BaselineChange;
use crate::workspace::{ViewEvent, Workspace};

pub struct EditorSession {
    workspace: Workspace,
    history: CommandHistory,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            history: CommandHistory::new(config.history_limit),
            workspace: Workspace::new(config),
        }
    }

    /// A session configured from `PAGE_EDITOR_*` environment variables.
    pub fn from_env() -> Self {
        Self::new(EditorConfig::from_env())
    }

    /// Start over with a new page; history is discarded.
    ///
    /// # Errors
    /// Returns an error if the markup cannot be parsed.
    pub fn load(&mut self, markup: &str, css: &str, script: &str) -> Result<()> {
        self.workspace.load(markup, css, script)?;
        self.history.clear();
        Ok(())
    }

    #[inline]
    pub const fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    #[inline]
    pub const fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn drain_events(&mut self) -> Vec<ViewEvent> {
        self.workspace.drain_events()
    }

    // -----------------------
    // History
    // -----------------------

    pub fn execute(&mut self, action: impl Into<Action>) -> bool {
        let done = self
            .history
            .execute(Command::new(action), &mut self.workspace);
        self.workspace.sync_selection();
        done
    }

    pub fn undo(&mut self) -> bool {
        let done = self.history.undo(&mut self.workspace);
        self.workspace.sync_selection();
        done
    }

    pub fn redo(&mut self) -> bool {
        let done = self.history.redo(&mut self.workspace);
        self.workspace.sync_selection();
        done
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// # Errors
    /// Returns an error if a record cannot be serialized.
    pub fn export_history(&self) -> Result<String> {
        self.history.export_json()
    }

    /// Load exported records as the undo list. Returns how many were kept.
    ///
    /// # Errors
    /// Returns an error if `json` is not a list of command records.
    pub fn import_history(&mut self, json: &str) -> Result<usize> {
        let commands = history_from_json(json)?;
        self.history.restore(commands);
        Ok(self.history.undo_len())
    }

    pub fn baseline_changes(&self) -> Vec<BaselineChange> {
        self.workspace.baseline_changes()
    }

    // -----------------------
    // Selection
    // -----------------------

    pub fn select(&mut self, identifier: &str) -> bool {
        self.workspace.select_identifier(identifier)
    }

    pub fn select_node(&mut self, node: NodeId) -> bool {
        self.workspace.select(node)
    }

    pub fn deselect(&mut self) {
        self.workspace.deselect();
    }

    pub fn toggle_hover(&mut self) -> bool {
        self.workspace.toggle_hover()
    }

    fn selection(&self) -> Option<String> {
        self.workspace.selection().map(str::to_owned)
    }

    // -----------------------
    // Element actions
    // -----------------------

    pub fn remove_selected(&mut self) -> bool {
        let Some(identifier) = self.selection() else {
            return false;
        };
        self.workspace.deselect();
        self.execute(RemoveElement::new(&identifier))
    }

    pub fn copy_selected(&mut self) -> bool {
        let Some(identifier) = self.selection() else {
            return false;
        };
        self.execute(CopyElement::new(&identifier))
    }

    /// Move the selection past its neighbouring element. False if there is
    /// no neighbour in that direction.
    pub fn move_selected(&mut self, direction: MoveDirection) -> bool {
        let Some(node) = self.workspace.selected_node() else {
            return false;
        };
        let document = self.workspace.document();
        let neighbour = match direction {
            MoveDirection::Up => document.previous_element_sibling(node),
            MoveDirection::Down => document.next_element_sibling(node),
        };
        if neighbour.is_none() {
            return false;
        }
        let Some(identifier) = self.selection() else {
            return false;
        };
        self.execute(MoveElement::new(&identifier, direction))
    }

    /// Current content of an element in the given editing mode.
    pub fn content_of(&self, identifier: &str, mode: TextMode) -> Option<String> {
        let node = self.workspace.find(identifier)?;
        let document = self.workspace.document();
        Some(match mode {
            TextMode::Plain => document.text_content(node),
            TextMode::Rich => self.workspace.clean_inner_html(node),
            TextMode::FormValue if document.tag_name(node) == Some("textarea") => {
                document.text_content(node)
            }
            TextMode::FormValue => document.attr(node, "value").unwrap_or_default().to_owned(),
        })
    }

    pub fn change_text(&mut self, identifier: &str, content: &str, mode: TextMode) -> bool {
        let Some(old) = self.content_of(identifier, mode) else {
            return false;
        };
        if old == content {
            return false;
        }
        self.execute(ChangeText::new(identifier, &old, content, mode))
    }

    /// Replace the page body with new markup.
    pub fn replace_page(&mut self, markup: &str) -> bool {
        self.workspace.deselect();
        let old = self.workspace.page_markup();
        if old == markup {
            return false;
        }
        self.execute(ReplaceDocument::new(&old, markup))
    }

    // -----------------------
    // Stylesheet and script
    // -----------------------

    pub fn replace_stylesheet(&mut self, css: &str) -> bool {
        let old = self.workspace.stylesheet().current_text();
        if old == css {
            return false;
        }
        self.execute(ReplaceStylesheet::new(&old, css))
    }

    /// Set the properties of an existing rule. Unchanged values are not
    /// recorded.
    pub fn update_rule(&mut self, selector: &str, media: Option<&str>, properties: &str) -> bool {
        let Some(rule) = self.workspace.stylesheet().find(selector, media) else {
            return false;
        };
        if rule.properties == properties {
            return false;
        }
        let old = rule.properties.clone();
        self.execute(ChangeRule::new(selector, media, &old, properties))
    }

    /// Add a rule, optionally making the selected element match it.
    pub fn add_rule(
        &mut self,
        selector: &str,
        properties: &str,
        media: Option<&str>,
        apply_to_selection: bool,
    ) -> bool {
        if selector.trim().is_empty() {
            return false;
        }
        let target = apply_to_selection.then(|| self.selection()).flatten();
        self.execute(AddRule::new(selector, properties, media, target.as_deref()))
    }

    pub fn remove_rule(&mut self, selector: &str, media: Option<&str>) -> bool {
        let Some(rule) = self.workspace.stylesheet().find(selector, media) else {
            return false;
        };
        let properties = rule.properties.clone();
        self.execute(RemoveRule::new(selector, &properties, media))
    }

    pub fn change_script(&mut self, script: &str) -> bool {
        let old = self.workspace.script().text.clone();
        if old == script {
            return false;
        }
        self.execute(ChangeScript::new(&old, script))
    }

    // -----------------------
    // Preview and notes
    // -----------------------

    pub fn enter_preview(&mut self) -> bool {
        self.workspace.enter_preview()
    }

    pub fn exit_preview(&mut self) -> bool {
        self.workspace.exit_preview()
    }

    pub fn set_note(&mut self, identifier: &str, text: &str) -> bool {
        self.workspace.set_note(identifier, text)
    }

    // -----------------------
    // Proposals
    // -----------------------

    /// What an edit proposer should be shown for the current selection.
    pub fn edit_context(&self) -> Option<EditContext> {
        let node = self.workspace.selected_node()?;
        let mut seen = BTreeSet::new();
        Some(EditContext {
            element_id: self.selection()?,
            html: self.workspace.clean_outer_html(node),
            css: self
                .workspace
                .matching_rules()
                .into_iter()
                .filter(|matched| seen.insert(matched.index))
                .map(|matched| matched.rule)
                .collect(),
            javascript: self.workspace.script().text.clone(),
        })
    }

    /// Execute the commands realising `proposal`. Returns how many ran.
    pub fn apply_proposal(&mut self, context: &EditContext, proposal: EditProposal) -> usize {
        let actions = proposal.into_actions(context);
        log::debug!("applying proposal as {} commands", actions.len());
        actions
            .into_iter()
            .map(|action| self.execute(action))
            .filter(|done| *done)
            .count()
    }

    /// Execute the commands replacing the whole page. Returns how many ran.
    pub fn apply_page_proposal(&mut self, proposal: PageProposal) -> usize {
        self.workspace.deselect();
        let actions = proposal.into_actions(&self.workspace);
        actions
            .into_iter()
            .map(|action| self.execute(action))
            .filter(|done| *done)
            .count()
    }
}
