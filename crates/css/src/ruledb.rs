//! The ordered rule list and its mutation primitives.

use core::mem::replace;

use crate::parser::parse_rules;
use crate::types::{StyleRule, normalize_media};

/// Structured model of one stylesheet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StylesheetModel {
    rules: Vec<StyleRule>,
    /// Exact text of the last `parse`, for editors mirroring the source.
    source: String,
}

impl StylesheetModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole rule list with the rules parsed from `text`.
    pub fn parse(&mut self, text: &str) -> &[StyleRule] {
        text.clone_into(&mut self.source);
        self.rules = parse_rules(text);
        log::debug!("stylesheet parsed into {} rules", self.rules.len());
        &self.rules
    }

    #[inline]
    pub fn rules(&self) -> &[StyleRule] {
        &self.rules
    }

    /// Replace the rule list wholesale, e.g. to restore a captured state.
    pub fn set_rules(&mut self, rules: Vec<StyleRule>) {
        self.rules = rules;
    }

    #[inline]
    pub fn source_text(&self) -> &str {
        &self.source
    }

    /// Text describing the current rules: the last parsed source while the
    /// rules still match it, otherwise the generated stylesheet.
    pub fn current_text(&self) -> String {
        if parse_rules(&self.source) == self.rules {
            self.source.clone()
        } else {
            self.generate()
        }
    }

    pub fn position(&self, selector: &str, media: Option<&str>) -> Option<usize> {
        self.rules
            .iter()
            .position(|rule| rule.has_key(selector, media))
    }

    pub fn find(&self, selector: &str, media: Option<&str>) -> Option<&StyleRule> {
        self.rules.iter().find(|rule| rule.has_key(selector, media))
    }

    /// Overwrite the properties of the rule keyed `(selector, media)` in
    /// place, or append a new rule. Returns the overwritten properties.
    pub fn add_or_replace(
        &mut self,
        selector: &str,
        properties: &str,
        media: Option<&str>,
    ) -> Option<String> {
        if let Some(rule) = self
            .rules
            .iter_mut()
            .find(|rule| rule.has_key(selector, media))
        {
            return Some(replace(
                &mut rule.properties,
                properties.to_owned(),
            ));
        }
        self.rules
            .push(StyleRule::new(selector, properties, normalize_media(media)));
        None
    }

    /// Update an existing rule's properties without appending.
    /// Returns false if no rule has that key.
    pub fn set_properties(&mut self, selector: &str, media: Option<&str>, properties: &str) -> bool {
        match self
            .rules
            .iter_mut()
            .find(|rule| rule.has_key(selector, media))
        {
            Some(rule) => {
                properties.clone_into(&mut rule.properties);
                true
            }
            None => false,
        }
    }

    /// Delete the first rule keyed `(selector, media)`, returning where it
    /// was and what it held.
    pub fn remove(&mut self, selector: &str, media: Option<&str>) -> Option<(usize, StyleRule)> {
        let index = self.position(selector, media)?;
        Some((index, self.rules.remove(index)))
    }

    /// Insert at `index`, clamped to the end of the list.
    pub fn insert_at(&mut self, index: usize, rule: StyleRule) {
        let index = index.min(self.rules.len());
        self.rules.insert(index, rule);
    }

    pub fn remove_at(&mut self, index: usize) -> Option<StyleRule> {
        (index < self.rules.len()).then(|| self.rules.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_or_replace_keeps_position() {
        let mut model = StylesheetModel::new();
        model.parse(".a { color: red } .b { color: blue }");
        assert_eq!(model.source_text(), ".a { color: red } .b { color: blue }");
        let previous = model.add_or_replace(".a", "color: green;", None);
        assert_eq!(previous.as_deref(), Some("color: red;"));
        assert_eq!(model.rules()[0], StyleRule::new(".a", "color: green;", None));
        assert_eq!(model.add_or_replace(".a", "x: y;", Some("@media print")), None);
        assert_eq!(model.rules().len(), 3);
        assert_eq!(model.position(".a", Some("@media print")), Some(2));
    }

    #[test]
    fn remove_and_reinsert() {
        let mut model = StylesheetModel::new();
        model.parse(".a { color: red } .b { color: blue } .c { color: gray }");
        let (index, rule) = model.remove(".b", None).unwrap();
        assert_eq!(index, 1);
        assert!(model.remove(".b", None).is_none());
        model.insert_at(index, rule);
        assert_eq!(model.position(".b", None), Some(1));
        assert!(model.remove_at(9).is_none());
        model.insert_at(99, StyleRule::new(".z", "", None));
        assert_eq!(model.position(".z", None), Some(3));
    }

    #[test]
    fn current_text_follows_edits() {
        let mut model = StylesheetModel::new();
        model.parse(".a{color:red}");
        assert_eq!(model.current_text(), ".a{color:red}");
        model.add_or_replace(".a", "color: blue;", None);
        assert_eq!(model.current_text(), ".a {\n    color: blue;\n}");
    }

    #[test]
    fn set_properties_never_appends() {
        let mut model = StylesheetModel::new();
        assert!(!model.set_properties(".a", None, "color: red;"));
        assert!(model.rules().is_empty());
    }
}
