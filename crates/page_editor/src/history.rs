//! Undo/redo stacks around command execution.

use std::collections::VecDeque;

use crate::command::Command;
use crate::config::DEFAULT_HISTORY_LIMIT;
use crate::workspace::Workspace;

/// Whether a command is currently running.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HistoryState {
    #[default]
    Idle,
    Executing,
}

/// Bounded undo list (oldest first) and redo list (most recent last).
#[derive(Debug)]
pub struct CommandHistory {
    undo_stack: VecDeque<Command>,
    redo_stack: Vec<Command>,
    state: HistoryState,
    limit: usize,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl CommandHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            state: HistoryState::Idle,
            limit: limit.max(1),
        }
    }

    #[inline]
    pub const fn state(&self) -> HistoryState {
        self.state
    }

    #[inline]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Undo entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &Command> {
        self.undo_stack.iter()
    }

    /// Run `command` and record it. Ignored while another command runs.
    /// A command that skips (stale target, aborted replacement) is not
    /// recorded and leaves the redo list alone.
    pub fn execute(&mut self, mut command: Command, workspace: &mut Workspace) -> bool {
        if self.state == HistoryState::Executing {
            log::debug!("nested execute of '{}' rejected", command.description);
            return false;
        }
        self.state = HistoryState::Executing;
        if !command.execute(workspace) {
            log::debug!("'{}' changed nothing; not recorded", command.description);
            self.state = HistoryState::Idle;
            return false;
        }
        self.undo_stack.push_back(command);
        self.redo_stack.clear();
        while self.undo_stack.len() > self.limit {
            if let Some(evicted) = self.undo_stack.pop_front() {
                log::trace!("history full, dropping '{}'", evicted.description);
            }
        }
        self.state = HistoryState::Idle;
        true
    }

    pub fn undo(&mut self, workspace: &mut Workspace) -> bool {
        if self.state == HistoryState::Executing {
            log::debug!("undo rejected while a command runs");
            return false;
        }
        let Some(mut command) = self.undo_stack.pop_back() else {
            return false;
        };
        self.state = HistoryState::Executing;
        command.undo(workspace);
        self.redo_stack.push(command);
        self.state = HistoryState::Idle;
        true
    }

    /// Re-run the most recently undone command. One that can no longer
    /// apply is dropped.
    pub fn redo(&mut self, workspace: &mut Workspace) -> bool {
        if self.state == HistoryState::Executing {
            log::debug!("redo rejected while a command runs");
            return false;
        }
        let Some(mut command) = self.redo_stack.pop() else {
            return false;
        };
        self.state = HistoryState::Executing;
        let applied = command.execute(workspace);
        if applied {
            self.undo_stack.push_back(command);
        } else {
            log::debug!("redo of '{}' skipped; dropping it", command.description);
        }
        self.state = HistoryState::Idle;
        applied
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Replace the undo list with previously exported entries without
    /// running them. The redo list is emptied.
    pub fn restore(&mut self, commands: Vec<Command>) {
        self.clear();
        let skip = commands.len().saturating_sub(self.limit);
        self.undo_stack.extend(commands.into_iter().skip(skip));
    }

    /// The undo list as a JSON array of command records, oldest first.
    ///
    /// # Errors
    /// Returns an error if a record cannot be serialized.
    pub fn export_json(&self) -> anyhow::Result<String> {
        let records: Vec<&Command> = self.undo_stack.iter().collect();
        Ok(serde_json::to_string_pretty(&records)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Action, ChangeRule, ChangeScript, RemoveRule, history_from_json};
    use crate::config::EditorConfig;

    fn script_change(from: usize, to: usize) -> Command {
        Command::new(ChangeScript::new(&format!("v{from}"), &format!("v{to}")))
    }

    fn workspace() -> Workspace {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut workspace = Workspace::new(EditorConfig::default());
        workspace.load("<p>x</p>", "", "v0").unwrap();
        workspace
    }

    #[test]
    fn undo_redo_walk_the_stacks() {
        let mut ws = workspace();
        let mut history = CommandHistory::default();
        assert!(!history.undo(&mut ws));
        assert!(history.execute(script_change(0, 1), &mut ws));
        assert!(history.execute(script_change(1, 2), &mut ws));
        assert_eq!(ws.script().text, "v2");

        assert!(history.undo(&mut ws));
        assert_eq!(ws.script().text, "v1");
        assert!(history.can_redo());
        assert!(history.redo(&mut ws));
        assert_eq!(ws.script().text, "v2");
        assert!(!history.redo(&mut ws));

        history.undo(&mut ws);
        history.execute(script_change(1, 5), &mut ws);
        assert_eq!(history.redo_len(), 0);
        assert_eq!(history.undo_len(), 2);
        history.clear();
        assert!(!history.can_undo());
    }

    #[test]
    fn oldest_entry_is_evicted_at_the_limit() {
        let mut ws = workspace();
        let mut history = CommandHistory::default();
        for step in 0..101 {
            history.execute(script_change(step, step + 1), &mut ws);
        }
        assert_eq!(history.undo_len(), 100);
        let oldest = history.entries().next().unwrap();
        assert!(matches!(
            &oldest.action,
            Action::ChangeScript(change) if change.old_script == "v1"
        ));
    }

    #[test]
    fn busy_history_rejects_everything() {
        let mut ws = workspace();
        let mut history = CommandHistory::new(10);
        history.execute(script_change(0, 1), &mut ws);
        history.state = HistoryState::Executing;
        assert!(!history.execute(script_change(1, 2), &mut ws));
        assert!(!history.undo(&mut ws));
        assert!(!history.redo(&mut ws));
        assert_eq!(ws.script().text, "v1");
        assert_eq!(history.undo_len(), 1);
        history.state = HistoryState::Idle;
        assert!(history.undo(&mut ws));
    }

    #[test]
    fn skipped_commands_are_not_recorded() {
        let mut ws = workspace();
        let mut history = CommandHistory::default();
        history.execute(script_change(0, 1), &mut ws);
        history.execute(script_change(1, 2), &mut ws);
        history.undo(&mut ws);
        assert!(!history.execute(Command::new(RemoveRule::new(".gone", "", None)), &mut ws));
        assert_eq!(history.undo_len(), 1);
        assert_eq!(history.redo_len(), 1);
        assert_eq!(history.state(), HistoryState::Idle);
        assert!(history.redo(&mut ws));
        assert_eq!(ws.script().text, "v2");
    }

    #[test]
    fn redo_drops_a_command_that_no_longer_applies() {
        let mut ws = workspace();
        ws.load("<p>x</p>", ".a { color: red }", "v0").unwrap();
        let mut history = CommandHistory::default();
        let change = ChangeRule::new(".a", None, "color: red", "color: blue");
        assert!(history.execute(Command::new(change), &mut ws));
        history.undo(&mut ws);
        assert!(ws.stylesheet.remove(".a", None).is_some());
        assert!(!history.redo(&mut ws));
        assert!(!history.can_redo());
        assert!(!history.can_undo());
    }

    #[test]
    fn export_and_restore() {
        let mut ws = workspace();
        let mut history = CommandHistory::new(2);
        for step in 0..3 {
            history.execute(script_change(step, step + 1), &mut ws);
        }
        let exported = history.export_json().unwrap();
        let commands = history_from_json(&exported).unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].description, "Edit script");

        let mut restored = CommandHistory::new(1);
        restored.restore(commands);
        assert_eq!(restored.undo_len(), 1);
        assert!(restored.undo(&mut ws));
        assert_eq!(ws.script().text, "v2");
    }
}
