//! Which rules apply to an element, with optional `:hover` simulation.

use crate::ruledb::StylesheetModel;
use crate::types::{HOVER_MARKER, RuleMatch};
use css_selectors::{
    ElementAdapter, matches_complex, parse_complex_selector, specificity_of_complex,
    split_selector_list,
};

impl StylesheetModel {
    /// Rules whose selector matches `element`, in rule order, with the first
    /// matching clause of each rule. Hover clauses only match when
    /// `hover_simulated` is set, and are then tested with the marker
    /// stripped. Malformed clauses are skipped.
    pub fn match_rules<A: ElementAdapter>(
        &self,
        adapter: &A,
        element: A::Handle,
        hover_simulated: bool,
    ) -> Vec<RuleMatch> {
        let mut matches = Vec::new();
        for (index, rule) in self.rules().iter().enumerate() {
            if rule.is_raw() {
                continue;
            }
            for clause in split_selector_list(&rule.selector) {
                let is_hover = clause.contains(HOVER_MARKER);
                if is_hover && !hover_simulated {
                    continue;
                }
                let base = if is_hover {
                    clause.replace(HOVER_MARKER, "")
                } else {
                    clause.to_owned()
                };
                if base.trim().is_empty() {
                    continue;
                }
                let selector = match parse_complex_selector(&base) {
                    Ok(selector) => selector,
                    Err(err) => {
                        log::trace!("skipping selector clause {clause:?}: {err}");
                        continue;
                    }
                };
                if !matches_complex(adapter, element, &selector) {
                    continue;
                }
                let specificity = parse_complex_selector(clause)
                    .map_or_else(|_| specificity_of_complex(&selector), |original| {
                        specificity_of_complex(&original)
                    });
                matches.push(RuleMatch {
                    index,
                    rule: rule.clone(),
                    matched_selector: clause.to_owned(),
                    specificity,
                });
                break;
            }
        }
        matches
    }
}
