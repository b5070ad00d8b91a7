//! Turning stylesheet text into structured rules.

use crate::types::{StyleRule, normalize_selector};
use css_syntax::{Declaration, Rule, RuleKind, parse_stylesheet};

/// Declarations rendered the way CSSOM `cssText` renders them:
/// `name: value;` separated by single spaces.
pub fn declarations_text(declarations: &[Declaration]) -> String {
    declarations
        .iter()
        .map(|declaration| {
            if declaration.important {
                format!("{}: {} !important;", declaration.name, declaration.value)
            } else {
                format!("{}: {};", declaration.name, declaration.value)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn from_syntax(rule: Rule) -> StyleRule {
    let media = rule.condition.as_deref();
    match rule.kind {
        RuleKind::Style(style) => StyleRule::new(
            &normalize_selector(&style.prelude),
            &declarations_text(&style.declarations),
            media,
        ),
        RuleKind::Opaque(text) => StyleRule::raw(&text, media),
    }
}

/// Parse stylesheet text into rules. A sheet that fails to parse is kept
/// whole as a single raw rule.
pub fn parse_rules(text: &str) -> Vec<StyleRule> {
    match parse_stylesheet(text) {
        Ok(sheet) => sheet.rules.into_iter().map(from_syntax).collect(),
        Err(err) => {
            log::warn!("stylesheet kept as raw text: {err}");
            vec![StyleRule::raw(text, None)]
        }
    }
}
