//! End-to-end editing through a session: every command kind must undo to
//! the exact prior state and redo to the exact post-execute state.

use css::StyleRule;
use page_editor::command::{CopyElement, MoveElement, ReconcileRules, RemoveElement, ReplaceSubtree};
use page_editor::{
    BaselineChange, Command, EditorConfig, EditorSession, MoveDirection, TextMode, ViewEvent,
    Workspace,
};

const PAGE: &str = "<main><h1>Title</h1><p class=\"a\">x</p><p>y</p></main>";
const STYLES: &str = "p { color: red } .a { margin: 0 }";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn session(markup: &str, css: &str) -> EditorSession {
    init_logging();
    let mut session = EditorSession::default();
    session.load(markup, css, "init();").unwrap();
    session
}

#[derive(Debug, PartialEq)]
struct State {
    markup: String,
    rules: Vec<StyleRule>,
    changes: Vec<BaselineChange>,
    script: String,
}

fn state(session: &EditorSession) -> State {
    let workspace = session.workspace();
    State {
        markup: workspace.page_markup(),
        rules: workspace.stylesheet().rules().to_vec(),
        changes: workspace.baseline_changes(),
        script: workspace.script().text.clone(),
    }
}

/// Run `edit`, then walk undo, redo and undo again, checking each state.
fn assert_reversible(session: &mut EditorSession, edit: impl FnOnce(&mut EditorSession) -> bool) {
    let before = state(session);
    assert!(edit(session), "edit was not recorded");
    let after = state(session);
    assert_ne!(before, after, "edit changed nothing");

    assert!(session.undo());
    assert_eq!(state(session), before);
    assert!(session.redo());
    assert_eq!(state(session), after);
    assert!(session.undo());
    assert_eq!(state(session), before);
}

#[test]
fn text_edits_are_reversible() {
    let mut s = session(PAGE, STYLES);
    assert_reversible(&mut s, |s| s.change_text("edit-3", "Heading", TextMode::Plain));
    assert_reversible(&mut s, |s| {
        s.change_text("edit-4", "<b>bold</b> and <i>more</i>", TextMode::Rich)
    });
    assert!(!s.change_text("edit-3", "Title", TextMode::Plain));
}

#[test]
fn rich_text_redo_keeps_identifiers() {
    let mut s = session(PAGE, STYLES);
    assert!(s.change_text("edit-4", "<b>bold</b>", TextMode::Rich));
    let node = s.workspace().find("edit-4").unwrap();
    let produced = s.workspace().clean_inner_html(node);
    assert_eq!(produced, "<b data-edit-id=\"edit-6\">bold</b>");
    s.undo();
    s.redo();
    let node = s.workspace().find("edit-4").unwrap();
    assert_eq!(s.workspace().clean_inner_html(node), produced);
}

#[test]
fn form_values_are_reversible() {
    let mut s = session(
        "<form><input value=\"a\"><textarea>b</textarea></form>",
        "",
    );
    assert_reversible(&mut s, |s| s.change_text("edit-3", "changed", TextMode::FormValue));
    assert_reversible(&mut s, |s| s.change_text("edit-4", "longer", TextMode::FormValue));
    assert_eq!(s.content_of("edit-4", TextMode::FormValue).as_deref(), Some("b"));
}

#[test]
fn rule_edits_are_reversible() {
    let mut s = session(PAGE, STYLES);
    assert_reversible(&mut s, |s| s.update_rule("p", None, "color: blue;"));
    assert_reversible(&mut s, |s| s.remove_rule(".a", None));
    assert_reversible(&mut s, |s| s.add_rule(".new", "padding: 1px;", None, false));
    assert_reversible(&mut s, |s| s.replace_stylesheet("body { margin: 0 }"));
    assert!(!s.update_rule(".missing", None, "color: blue;"));
    assert!(!s.remove_rule(".missing", None));
}

#[test]
fn add_rule_applied_to_selection_is_reversible() {
    let mut s = session(PAGE, STYLES);
    assert!(s.select("edit-5"));
    assert_reversible(&mut s, |s| s.add_rule(".hl", "color: red;", None, true));

    s.redo();
    let node = s.workspace().find("edit-5").unwrap();
    assert!(s.workspace().document().has_class(node, "hl"));
    let changes = s.baseline_changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].identifier, "edit-5");
    assert_eq!(changes[0].current.class_list, "hl");
}

#[test]
fn element_commands_are_reversible() {
    let mut s = session(PAGE, STYLES);
    assert_reversible(&mut s, |s| s.select("edit-4") && s.remove_selected());
    assert_reversible(&mut s, |s| s.select("edit-5") && s.move_selected(MoveDirection::Up));
    assert_reversible(&mut s, |s| s.select("edit-3") && s.move_selected(MoveDirection::Down));
    assert_reversible(&mut s, |s| s.select("edit-3") && s.copy_selected());
    assert_reversible(&mut s, |s| {
        let node = s.workspace().find("edit-4").unwrap();
        let old = s.workspace().clean_outer_html(node);
        s.execute(ReplaceSubtree::new("edit-4", &old, "<p class=\"b\">z <em>new</em></p>"))
    });
}

#[test]
fn script_and_reconcile_are_reversible() {
    let mut s = session(PAGE, ".a { color: red; } .c { color: yellow; }");
    assert_reversible(&mut s, |s| s.change_script("run();"));
    assert!(!s.change_script("init();"));
    assert_reversible(&mut s, |s| {
        s.execute(ReconcileRules::new(
            vec![StyleRule::new(".a", "color: red;", None)],
            vec![
                StyleRule::new(".a", "color: blue;", None),
                StyleRule::new(".b", "color: green;", None),
            ],
        ))
    });
}

#[test]
fn document_replace_resets_the_baseline() {
    let mut s = session("<p>x</p>", ".b { color: red }");
    s.select("edit-2");
    s.add_rule(".b", "color: red;", None, true);
    assert_eq!(s.baseline_changes().len(), 1);

    assert!(s.replace_page("<section class=\"b\"><p>new</p></section>"));
    assert_eq!(s.workspace().selection(), None);
    assert!(s.baseline_changes().is_empty());
    assert_eq!(
        s.workspace().page_markup(),
        "<section class=\"b\" data-edit-id=\"edit-3\"><p data-edit-id=\"edit-4\">new</p></section>"
    );

    assert!(s.undo());
    assert!(s.baseline_changes().is_empty());
    assert_eq!(
        s.workspace().page_markup(),
        "<p data-edit-id=\"edit-2\" class=\"b\">x</p>"
    );
    assert!(s.redo());
    assert!(s.workspace().find("edit-4").is_some());
}

#[test]
fn new_command_clears_redo() {
    let mut s = session(PAGE, STYLES);
    s.change_script("one();");
    s.change_script("two();");
    s.undo();
    assert!(s.history().can_redo());
    s.change_script("three();");
    assert!(!s.history().can_redo());
    assert!(!s.redo());
    assert_eq!(s.workspace().script().text, "three();");
}

#[test]
fn history_is_bounded() {
    let mut s = session(PAGE, STYLES);
    for step in 0..105 {
        assert!(s.change_script(&format!("step{step}();")));
    }
    assert_eq!(s.history().undo_len(), 100);
    let mut undone = 0;
    while s.undo() {
        undone += 1;
    }
    assert_eq!(undone, 100);
    assert_eq!(s.workspace().script().text, "step4();");
}

#[test]
fn missing_targets_are_no_ops() {
    let mut s = session(PAGE, STYLES);
    let before = state(&s);
    assert!(!s.execute(RemoveElement::new("edit-99")));
    assert_eq!(state(&s), before);
    assert_eq!(s.history().undo_len(), 0);
    assert!(!s.undo());
    assert!(!s.select("edit-99"));
    assert!(!s.change_text("edit-99", "x", TextMode::Plain));
}

#[test]
fn removal_undo_appends_when_the_next_sibling_is_gone() {
    init_logging();
    let mut workspace = Workspace::new(EditorConfig::default());
    workspace
        .load("<main><p>a</p><p>b</p><p>c</p></main>", "", "")
        .unwrap();
    let mut first = Command::new(RemoveElement::new("edit-3"));
    let mut second = Command::new(RemoveElement::new("edit-4"));
    first.execute(&mut workspace);
    second.execute(&mut workspace);
    first.undo(&mut workspace);
    assert_eq!(
        workspace.page_markup(),
        "<main data-edit-id=\"edit-2\"><p data-edit-id=\"edit-5\">c</p><p data-edit-id=\"edit-3\">a</p></main>"
    );
}

#[test]
fn moves_carry_notes_along() {
    let mut s = session(
        "<main><!-- EDIT_NOTE: first --><p>a</p><p>b</p></main>",
        "",
    );
    assert_eq!(s.workspace().note_text("edit-3").as_deref(), Some("first"));
    s.select("edit-4");
    assert!(s.move_selected(MoveDirection::Up));
    assert_eq!(
        s.workspace().page_markup(),
        "<main data-edit-id=\"edit-2\"><p data-edit-id=\"edit-4\">b</p><!-- EDIT_NOTE: first --><p data-edit-id=\"edit-3\">a</p></main>"
    );
    assert_eq!(s.workspace().note_text("edit-3").as_deref(), Some("first"));
    assert!(!s.move_selected(MoveDirection::Up));
    assert_eq!(s.history().undo_len(), 1);
}

#[test]
fn copies_get_fresh_identifiers() {
    let mut s = session("<main><p class=\"a\">a</p></main>", "");
    s.select("edit-3");
    assert!(s.copy_selected());
    assert_eq!(s.workspace().selection(), Some("edit-4"));
    assert_eq!(
        s.workspace().page_markup(),
        "<main data-edit-id=\"edit-2\"><p class=\"a\" data-edit-id=\"edit-3\">a</p><p class=\"a\" data-edit-id=\"edit-4\">a</p></main>"
    );
    assert!(s.baseline_changes().is_empty());
    s.undo();
    assert_eq!(s.workspace().selection(), Some("edit-3"));
}

#[test]
fn subtree_replace_needs_a_single_element() {
    let mut s = session(PAGE, STYLES);
    let before = state(&s);
    let node = s.workspace().find("edit-4").unwrap();
    let old = s.workspace().clean_outer_html(node);
    s.change_script("kept();");
    s.undo();
    assert!(!s.execute(ReplaceSubtree::new("edit-4", &old, "<p>a</p><p>b</p>")));
    assert_eq!(state(&s), before);
    assert!(!s.execute(ReplaceSubtree::new("edit-4", &old, "<p>a</p> trailing")));
    assert_eq!(state(&s), before);
    assert_eq!(s.history().undo_len(), 0);
    assert!(s.history().can_redo());
}

#[test]
fn page_root_is_not_editable() {
    let mut s = session(PAGE, STYLES);
    let before = state(&s);
    assert!(!s.select("edit-1"));
    assert_eq!(s.workspace().selection(), None);
    assert!(!s.execute(RemoveElement::new("edit-1")));
    assert!(!s.execute(CopyElement::new("edit-1")));
    assert!(!s.execute(MoveElement::new("edit-1", MoveDirection::Up)));
    assert!(!s.execute(ReplaceSubtree::new("edit-1", "", "<div>x</div>")));
    assert_eq!(state(&s), before);
    assert!(s.workspace().find("edit-1").is_some());
    assert_eq!(s.history().undo_len(), 0);
}

#[test]
fn table_rows_survive_removal_and_undo() {
    let mut s = session(
        "<table><tbody><tr><td>a</td></tr><tr><td>b</td></tr></tbody></table>",
        "",
    );
    assert_reversible(&mut s, |s| s.select("edit-4") && s.remove_selected());
    assert!(s.workspace().find("edit-5").is_some());
    assert_eq!(
        s.workspace().page_markup(),
        "<table data-edit-id=\"edit-2\"><tbody data-edit-id=\"edit-3\">\
         <tr data-edit-id=\"edit-4\"><td data-edit-id=\"edit-5\">a</td></tr>\
         <tr data-edit-id=\"edit-6\"><td data-edit-id=\"edit-7\">b</td></tr>\
         </tbody></table>"
    );
    assert_reversible(&mut s, |s| {
        s.change_text("edit-3", "<tr><td>c</td></tr>", TextMode::Rich)
    });
}

#[test]
fn rich_edits_rerecord_the_subtree_baseline() {
    let mut s = session("<div><span class=\"x\">a</span></div>", "");
    let edited = "<span data-edit-id=\"edit-3\" class=\"y\">a</span>";
    assert!(s.change_text("edit-2", edited, TextMode::Rich));
    assert!(s.baseline_changes().is_empty());

    assert!(s.undo());
    assert!(s.baseline_changes().is_empty());
    let span = s.workspace().find("edit-3").unwrap();
    assert!(s.workspace().document().has_class(span, "x"));
    assert!(!s.workspace().document().has_class(span, "y"));

    assert!(s.redo());
    assert!(s.baseline_changes().is_empty());
}

#[test]
fn stylesheet_replacement_reports_the_exact_text() {
    let mut s = session(PAGE, STYLES);
    s.drain_events();
    assert!(s.replace_stylesheet("p{color:blue}"));
    let events = s.drain_events();
    assert!(events.contains(&ViewEvent::StylesheetSource {
        text: "p{color:blue}".into()
    }));
    assert!(!s.replace_stylesheet("p{color:blue}"));
    s.undo();
    assert!(s.drain_events().contains(&ViewEvent::StylesheetSource {
        text: STYLES.into()
    }));
}

#[test]
fn exported_history_can_be_imported() {
    let mut s = session(PAGE, STYLES);
    s.change_text("edit-3", "Heading", TextMode::Plain);
    s.change_script("run();");
    let exported = s.export_history().unwrap();

    let mut other = session(PAGE, STYLES);
    other.change_text("edit-3", "Heading", TextMode::Plain);
    other.change_script("run();");
    other.clear_history();
    assert_eq!(other.import_history(&exported).unwrap(), 2);
    assert!(other.undo());
    assert!(other.undo());
    assert_eq!(state(&other), state(&session(PAGE, STYLES)));
    assert!(other.import_history("{}").is_err());
}
