//! Editing core for a visual web-page editor.
//!
//! A loaded page (markup, stylesheet, script) lives in a [`Workspace`].
//! Every element in the editable body carries a stable identifier so edits
//! can be recorded as serializable [`Command`]s that find their targets
//! again later. [`CommandHistory`] runs those commands with bounded undo
//! and redo, and [`EditorSession`] ties both together behind the actions a
//! user interface offers.
#![allow(
    clippy::missing_docs_in_private_items,
    reason = "Internal implementation details don't need public documentation"
)]
#![allow(
    clippy::missing_inline_in_public_items,
    reason = "Inlining decisions left to compiler for this crate"
)]

pub mod annotations;
pub mod command;
pub mod config;
pub mod history;
pub mod identity;
pub mod proposal;
pub mod session;
pub mod snapshot;
pub mod workspace;

pub use annotations::{Annotation, AnnotationIndex, NotePosition};
pub use command::{Action, Command, MoveDirection, Reversible, TextMode, reconcile_rules};
pub use config::{DEFAULT_HISTORY_LIMIT, EditorConfig};
pub use history::{CommandHistory, HistoryState};
pub use identity::IdentityAssignor;
pub use proposal::{EditContext, EditProposal, PageProposal, strip_fences};
pub use session::EditorSession;
pub use snapshot::{BaselineChange, BaselineEntry, SnapshotStore};
pub use workspace::{ScriptState, ViewEvent, Workspace};
