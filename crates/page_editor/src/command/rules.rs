use std::collections::HashSet;

use css::{StyleRule, normalize_media};
use serde::{Deserialize, Serialize};

use super::Reversible;
use crate::workspace::Workspace;

/// Rules are identified by selector and normalized media wrapper.
type RuleKey = (String, Option<String>);

fn rule_key(rule: &StyleRule) -> RuleKey {
    (
        rule.selector.clone(),
        normalize_media(rule.media.as_deref()).map(str::to_owned),
    )
}

/// Overwrite one rule's properties in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRule {
    pub selector: String,
    #[serde(default)]
    pub media: Option<String>,
    pub old_properties: String,
    pub new_properties: String,
}

impl ChangeRule {
    pub fn new(selector: &str, media: Option<&str>, old_properties: &str, new_properties: &str) -> Self {
        Self {
            selector: selector.to_owned(),
            media: normalize_media(media).map(str::to_owned),
            old_properties: old_properties.to_owned(),
            new_properties: new_properties.to_owned(),
        }
    }

    fn apply(&self, workspace: &mut Workspace, properties: &str) -> bool {
        if workspace
            .stylesheet
            .set_properties(&self.selector, self.media.as_deref(), properties)
        {
            workspace.refresh_styles();
            true
        } else {
            log::debug!("rule {} no longer exists", self.selector);
            false
        }
    }
}

impl Reversible for ChangeRule {
    fn execute(&mut self, workspace: &mut Workspace) -> bool {
        self.apply(workspace, &self.new_properties)
    }

    fn undo(&mut self, workspace: &mut Workspace) {
        self.apply(workspace, &self.old_properties);
    }

    fn describe(&self) -> String {
        format!("Edit rule {}", self.selector)
    }
}

/// The class or id named by a selector of the form `.name` or `#name`.
fn simple_target(selector: &str) -> Option<(char, String)> {
    let mut chars = selector.chars();
    let sigil = chars.next().filter(|first| matches!(first, '.' | '#'))?;
    let name = chars.as_str();
    let plain = !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_alphanumeric() || matches!(ch, '-' | '_'));
    plain.then(|| (sigil, name.to_owned()))
}

/// Add a rule, optionally giving an element the class or id it selects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRule {
    pub selector: String,
    pub properties: String,
    #[serde(default)]
    pub media: Option<String>,
    /// Element that should start matching the new rule.
    #[serde(default)]
    pub element_id: Option<String>,
    /// Properties of a rule with the same key that the add overwrote.
    #[serde(default)]
    pub previous_properties: Option<String>,
    /// Whether the element's attributes were touched, and their prior values.
    #[serde(default)]
    pub applied_to_element: bool,
    #[serde(default)]
    pub previous_class: Option<String>,
    #[serde(default)]
    pub previous_id: Option<String>,
}

impl AddRule {
    pub fn new(selector: &str, properties: &str, media: Option<&str>, element_id: Option<&str>) -> Self {
        Self {
            selector: selector.trim().to_owned(),
            properties: properties.to_owned(),
            media: normalize_media(media).map(str::to_owned),
            element_id: element_id.map(str::to_owned),
            previous_properties: None,
            applied_to_element: false,
            previous_class: None,
            previous_id: None,
        }
    }

    fn apply_to_element(&mut self, workspace: &mut Workspace) {
        self.applied_to_element = false;
        let Some(element_id) = self.element_id.as_deref() else {
            return;
        };
        let Some((sigil, name)) = simple_target(&self.selector) else {
            return;
        };
        let Some(node) = workspace.find(element_id) else {
            log::debug!("rule target {element_id} not found");
            return;
        };
        let document = &mut workspace.document;
        self.previous_class = document.attr(node, "class").map(str::to_owned);
        self.previous_id = document.attr(node, "id").map(str::to_owned);
        if sigil == '.' {
            document.add_class(node, &name);
        } else {
            document.set_attr(node, "id", &name);
        }
        self.applied_to_element = true;
    }

    fn restore_element(&self, workspace: &mut Workspace) {
        if !self.applied_to_element {
            return;
        }
        let Some(node) = self
            .element_id
            .as_deref()
            .and_then(|element_id| workspace.find(element_id))
        else {
            return;
        };
        let document = &mut workspace.document;
        for (name, previous) in [("class", &self.previous_class), ("id", &self.previous_id)] {
            match previous {
                Some(value) => {
                    document.set_attr(node, name, value);
                }
                None => {
                    document.remove_attr(node, name);
                }
            }
        }
    }
}

impl Reversible for AddRule {
    fn execute(&mut self, workspace: &mut Workspace) -> bool {
        self.previous_properties = workspace.stylesheet.add_or_replace(
            &self.selector,
            &self.properties,
            self.media.as_deref(),
        );
        self.apply_to_element(workspace);
        workspace.refresh_styles();
        true
    }

    fn undo(&mut self, workspace: &mut Workspace) {
        match &self.previous_properties {
            Some(previous) => {
                workspace
                    .stylesheet
                    .set_properties(&self.selector, self.media.as_deref(), previous);
            }
            None => {
                workspace
                    .stylesheet
                    .remove(&self.selector, self.media.as_deref());
            }
        }
        self.restore_element(workspace);
        workspace.refresh_styles();
    }

    fn describe(&self) -> String {
        format!("Add rule {}", self.selector)
    }
}

/// Delete a rule; undo puts it back where it was.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRule {
    pub selector: String,
    pub properties: String,
    #[serde(default)]
    pub media: Option<String>,
    /// Position the rule was removed from, if it existed.
    #[serde(default)]
    pub removed_at: Option<usize>,
}

impl RemoveRule {
    pub fn new(selector: &str, properties: &str, media: Option<&str>) -> Self {
        Self {
            selector: selector.to_owned(),
            properties: properties.to_owned(),
            media: normalize_media(media).map(str::to_owned),
            removed_at: None,
        }
    }
}

impl Reversible for RemoveRule {
    fn execute(&mut self, workspace: &mut Workspace) -> bool {
        let Some((index, rule)) = workspace
            .stylesheet
            .remove(&self.selector, self.media.as_deref())
        else {
            log::debug!("rule {} was already gone", self.selector);
            self.removed_at = None;
            return false;
        };
        self.properties = rule.properties;
        self.removed_at = Some(index);
        workspace.refresh_styles();
        true
    }

    fn undo(&mut self, workspace: &mut Workspace) {
        let Some(index) = self.removed_at else {
            return;
        };
        workspace.stylesheet.insert_at(
            index,
            StyleRule::new(&self.selector, &self.properties, self.media.as_deref()),
        );
        workspace.refresh_styles();
    }

    fn describe(&self) -> String {
        format!("Remove rule {}", self.selector)
    }
}

/// Merge a proposed set of rules into `current`.
///
/// `context` is what the proposer was shown. Current rules keyed in the
/// context are updated from the proposal or, when the proposal dropped
/// them, deleted. Proposed rules left over update a rule with the same key
/// elsewhere in the list, or are appended.
pub fn reconcile_rules(
    current: &[StyleRule],
    context: &[StyleRule],
    proposed: &[StyleRule],
) -> Vec<StyleRule> {
    let context_keys: HashSet<RuleKey> = context.iter().map(rule_key).collect();
    let mut pending: Vec<(RuleKey, &StyleRule)> = Vec::new();
    for rule in proposed {
        let key = rule_key(rule);
        match pending.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = rule,
            None => pending.push((key, rule)),
        }
    }

    let mut merged = current.to_vec();
    for index in (0..merged.len()).rev() {
        let Some(key) = merged.get(index).map(rule_key) else {
            continue;
        };
        if !context_keys.contains(&key) {
            continue;
        }
        match pending.iter().position(|(candidate, _)| *candidate == key) {
            Some(position) => {
                let (_, replacement) = pending.remove(position);
                if let Some(rule) = merged.get_mut(index) {
                    rule.properties.clone_from(&replacement.properties);
                }
            }
            None => {
                merged.remove(index);
            }
        }
    }

    for (key, rule) in pending {
        match merged.iter_mut().find(|existing| rule_key(existing) == key) {
            Some(existing) => existing.properties.clone_from(&rule.properties),
            None => merged.push(StyleRule::new(
                &rule.selector,
                &rule.properties,
                rule.media.as_deref(),
            )),
        }
    }
    merged
}

/// Apply a batch of proposed rules against the context it was made from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileRules {
    pub context_rules: Vec<StyleRule>,
    pub proposed_rules: Vec<StyleRule>,
    /// The full rule list before the merge.
    #[serde(default)]
    pub previous_rules: Option<Vec<StyleRule>>,
}

impl ReconcileRules {
    pub fn new(context_rules: Vec<StyleRule>, proposed_rules: Vec<StyleRule>) -> Self {
        Self {
            context_rules,
            proposed_rules,
            previous_rules: None,
        }
    }
}

impl Reversible for ReconcileRules {
    fn execute(&mut self, workspace: &mut Workspace) -> bool {
        let current = workspace.stylesheet.rules().to_vec();
        let merged = reconcile_rules(&current, &self.context_rules, &self.proposed_rules);
        log::debug!(
            "reconciled {} proposed rules: {} -> {} rules",
            self.proposed_rules.len(),
            current.len(),
            merged.len()
        );
        self.previous_rules = Some(current);
        workspace.stylesheet.set_rules(merged);
        workspace.refresh_styles();
        true
    }

    fn undo(&mut self, workspace: &mut Workspace) {
        if let Some(previous) = &self.previous_rules {
            workspace.stylesheet.set_rules(previous.clone());
            workspace.refresh_styles();
        }
    }

    fn describe(&self) -> String {
        format!("Apply {} proposed rules", self.proposed_rules.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(selector: &str, properties: &str) -> StyleRule {
        StyleRule::new(selector, properties, None)
    }

    #[test]
    fn reconcile_updates_context_rules_and_appends_new_ones() {
        let merged = reconcile_rules(
            &[rule(".a", "color: red;"), rule(".c", "color: yellow;")],
            &[rule(".a", "color: red;")],
            &[rule(".a", "color: blue;"), rule(".b", "color: green;")],
        );
        assert_eq!(
            merged,
            [
                rule(".a", "color: blue;"),
                rule(".c", "color: yellow;"),
                rule(".b", "color: green;"),
            ]
        );
    }

    #[test]
    fn reconcile_removes_rules_dropped_from_the_proposal() {
        let merged = reconcile_rules(
            &[rule(".x", "margin: 0;"), rule(".a", "color: red;")],
            &[rule(".a", "color: red;")],
            &[],
        );
        assert_eq!(merged, [rule(".x", "margin: 0;")]);
    }

    #[test]
    fn reconcile_updates_out_of_context_rules_instead_of_duplicating() {
        let merged = reconcile_rules(
            &[rule(".b", "color: gray;")],
            &[rule(".a", "color: red;")],
            &[rule(".b", "color: green;")],
        );
        assert_eq!(merged, [rule(".b", "color: green;")]);
    }

    #[test]
    fn reconcile_keys_include_media_and_last_proposal_wins() {
        let print = StyleRule::new(".a", "display: none;", Some("@media print"));
        let merged = reconcile_rules(
            &[rule(".a", "color: red;"), print.clone()],
            &[rule(".a", "color: red;")],
            &[
                rule(".a", "color: blue;"),
                StyleRule {
                    media: Some(String::new()),
                    ..rule(".a", "color: black;")
                },
            ],
        );
        assert_eq!(merged, [rule(".a", "color: black;"), print]);
    }

    #[test]
    fn duplicate_context_keys_drop_the_extra_copy() {
        let merged = reconcile_rules(
            &[rule(".a", "color: red;"), rule(".a", "color: pink;")],
            &[rule(".a", "color: red;")],
            &[rule(".a", "color: blue;")],
        );
        // The later copy consumes the proposal; the earlier one is deleted.
        assert_eq!(merged, [rule(".a", "color: blue;")]);
    }
}
