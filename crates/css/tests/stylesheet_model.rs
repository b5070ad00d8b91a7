//! Round-trip and matching behaviour of the stylesheet model against a
//! parsed document.

use css::{RAW_SELECTOR, StyleRule, StylesheetModel};
use html::Document;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const SAMPLE: &str = r#"
/* site styles */
body { margin: 0; font-family: "Helvetica Neue", sans-serif }
nav a, nav button:hover { color: #333; padding: 4px 8px }
.card:hover { box-shadow: 0 2px 4px rgba(0,0,0,.2) }
@keyframes fade { from { opacity: 0 } to { opacity: 1 } }
@media (max-width: 600px) {
  nav a { display: block }
  @font-face { font-family: Local; src: url(local.woff) }
}
.hero::before { content: "a;b" }
"#;

#[test]
fn generation_is_idempotent_after_one_pass() {
    init_logging();
    let mut model = StylesheetModel::new();
    model.parse(SAMPLE);
    let first = model.generate();

    let mut again = StylesheetModel::new();
    again.parse(&first);
    assert_eq!(again.generate(), first);

    // Media groups move after plain rules on the first pass only.
    let mut third = StylesheetModel::new();
    third.parse(&again.generate());
    assert_eq!(third.rules(), again.rules());
    assert_eq!(again.rules().len(), model.rules().len());
}

#[test]
fn parse_structure() {
    init_logging();
    let mut model = StylesheetModel::new();
    let rules = model.parse(SAMPLE).to_vec();
    assert_eq!(rules.len(), 7);
    assert_eq!(
        rules[0],
        StyleRule::new(
            "body",
            "margin: 0; font-family: \"Helvetica Neue\", sans-serif;",
            None
        )
    );
    assert_eq!(rules[1].selector, "nav a, nav button:hover");
    assert_eq!(rules[3].selector, RAW_SELECTOR);
    assert!(rules[3].properties.starts_with("@keyframes fade {"));
    assert_eq!(rules[4].media.as_deref(), Some("@media (max-width: 600px)"));
    assert_eq!(rules[5].selector, RAW_SELECTOR);
    assert_eq!(rules[5].media.as_deref(), Some("@media (max-width: 600px)"));
    assert_eq!(rules[6].properties, "content: \"a;b\";");
}

#[test]
fn matching_with_and_without_hover_simulation() {
    init_logging();
    let doc = Document::parse(
        "<nav><a href=\"/\">Home</a><button class=\"cta\">Go</button></nav><div class=\"card\">x</div>",
    )
    .unwrap();
    let body = doc.body().unwrap();
    let nav = doc.element_children(body)[0];
    let button = doc.element_children(nav)[1];
    let card = doc.element_children(body)[1];

    let mut model = StylesheetModel::new();
    model.parse(SAMPLE);

    assert!(model.match_rules(&doc, button, false).is_empty());
    let hovered = model.match_rules(&doc, button, true);
    assert_eq!(hovered.len(), 1);
    assert_eq!(hovered[0].index, 1);
    assert_eq!(hovered[0].matched_selector, "nav button:hover");

    let link = doc.element_children(nav)[0];
    let link_matches = model.match_rules(&doc, link, false);
    let indexes: Vec<usize> = link_matches.iter().map(|found| found.index).collect();
    assert_eq!(indexes, vec![1, 4]);
    assert_eq!(link_matches[0].matched_selector, "nav a");

    assert!(model.match_rules(&doc, card, false).is_empty());
    assert_eq!(model.match_rules(&doc, card, true).len(), 1);
}

#[test]
fn malformed_clauses_do_not_hide_other_rules() {
    init_logging();
    let doc = Document::parse("<p class=\"x\">t</p>").unwrap();
    let paragraph = doc.element_children(doc.body().unwrap())[0];
    let mut model = StylesheetModel::new();
    model.set_rules(vec![
        StyleRule::new("p:nonsense(, p.x", "color: red;", None),
        StyleRule::new("p:unknown-state, .x", "color: blue;", None),
        StyleRule::new(":hover", "color: green;", None),
    ]);
    let found = model.match_rules(&doc, paragraph, true);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].index, 1);
    assert_eq!(found[0].matched_selector, ".x");
}

#[test]
fn extreme_nth_selectors_match_nothing() {
    init_logging();
    let doc = Document::parse("<p>a</p><p>b</p>").unwrap();
    let second = doc.element_children(doc.body().unwrap())[1];
    let mut model = StylesheetModel::new();
    model.set_rules(vec![
        StyleRule::new("p:nth-child(-2147483647)", "color: red;", None),
        StyleRule::new("p", "margin: 0;", None),
    ]);
    let found = model.match_rules(&doc, second, false);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].index, 1);
}
