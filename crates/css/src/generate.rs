//! Canonical stylesheet text from the rule list.

use crate::ruledb::StylesheetModel;
use crate::types::{HOVER_MARKER, StyleRule, split_properties};

const INDENT: &str = "    ";

fn format_properties(properties: &str, indent: &str) -> String {
    split_properties(properties)
        .into_iter()
        .map(|property| format!("{indent}{property};"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serialize rules: unwrapped rules first in list order, then one block per
/// distinct media wrapper in order of first appearance.
pub fn generate_rules(rules: &[StyleRule]) -> String {
    let mut out = String::new();
    let mut groups: Vec<(&str, Vec<&StyleRule>)> = Vec::new();
    for rule in rules {
        let Some(media) = rule.media.as_deref() else {
            if rule.is_raw() {
                out.push_str(&rule.properties);
            } else {
                out.push_str(&format!(
                    "{} {{\n{}\n}}",
                    rule.selector,
                    format_properties(&rule.properties, INDENT)
                ));
            }
            out.push_str("\n\n");
            continue;
        };
        match groups.iter_mut().find(|(key, _)| *key == media) {
            Some((_, members)) => members.push(rule),
            None => groups.push((media, vec![rule])),
        }
    }
    let nested_indent = INDENT.repeat(2);
    for (media, members) in groups {
        out.push_str(media);
        out.push_str(" {\n");
        for rule in members {
            out.push_str(INDENT);
            if rule.is_raw() {
                out.push_str(&rule.properties);
            } else {
                out.push_str(&format!(
                    "{} {{\n{}\n{INDENT}}}",
                    rule.selector,
                    format_properties(&rule.properties, &nested_indent)
                ));
            }
            out.push('\n');
        }
        out.push_str("}\n\n");
    }
    out.trim().to_owned()
}

impl StylesheetModel {
    /// Canonical text for the current rule list.
    pub fn generate(&self) -> String {
        generate_rules(self.rules())
    }

    /// Plain rules that make `:hover` rules apply to elements carrying
    /// `hover_class`. Only the hover clauses of each rule are kept; media
    /// wrappers are preserved.
    pub fn hover_companion(&self, hover_class: &str) -> String {
        let replacement = format!(".{hover_class}");
        let companions: Vec<StyleRule> = self
            .rules()
            .iter()
            .filter_map(|rule| {
                let clauses = rule.hover_clauses();
                if clauses.is_empty() {
                    return None;
                }
                let selector = clauses
                    .iter()
                    .map(|clause| clause.replace(HOVER_MARKER, &replacement))
                    .collect::<Vec<_>>()
                    .join(", ");
                Some(StyleRule {
                    selector,
                    properties: rule.properties.clone(),
                    media: rule.media.clone(),
                })
            })
            .collect();
        generate_rules(&companions)
    }

    /// Full text for the live preview: editor chrome, the generated sheet
    /// and the hover companion.
    pub fn preview_text(&self, chrome: &str, hover_class: &str) -> String {
        [
            chrome.trim().to_owned(),
            self.generate(),
            self.hover_companion(hover_class),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
    }
}
