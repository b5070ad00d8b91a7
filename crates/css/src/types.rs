use css_selectors::{Specificity, split_selector_list};
use serde::{Deserialize, Serialize};

/// Selector value marking a rule whose `properties` hold verbatim
/// stylesheet text (an at-rule, or a sheet that failed to parse).
pub const RAW_SELECTOR: &str = "@raw";

/// The pseudo-class the editor can simulate on a pinned element.
pub const HOVER_MARKER: &str = ":hover";

/// One structured rule: a selector list, its declarations as text, and the
/// conditional group wrapping it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleRule {
    pub selector: String,
    pub properties: String,
    #[serde(default)]
    pub media: Option<String>,
}

impl StyleRule {
    pub fn new(selector: &str, properties: &str, media: Option<&str>) -> Self {
        Self {
            selector: selector.to_owned(),
            properties: properties.to_owned(),
            media: normalize_media(media).map(str::to_owned),
        }
    }

    /// A verbatim entry.
    pub fn raw(text: &str, media: Option<&str>) -> Self {
        Self::new(RAW_SELECTOR, text, media)
    }

    #[inline]
    pub fn is_raw(&self) -> bool {
        self.selector == RAW_SELECTOR
    }

    /// True if this rule is keyed by `(selector, media)`.
    pub fn has_key(&self, selector: &str, media: Option<&str>) -> bool {
        self.selector == selector && normalize_media(self.media.as_deref()) == normalize_media(media)
    }

    /// Selector clauses containing the hover marker.
    pub fn hover_clauses(&self) -> Vec<&str> {
        if self.is_raw() {
            return Vec::new();
        }
        split_selector_list(&self.selector)
            .into_iter()
            .filter(|clause| clause.contains(HOVER_MARKER))
            .collect()
    }
}

/// A rule that applies to an element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleMatch {
    /// Position of the rule in the model.
    pub index: usize,
    pub rule: StyleRule,
    /// The clause that matched, as written (hover marker included).
    pub matched_selector: String,
    pub specificity: Specificity,
}

/// Empty media text means "no wrapper".
pub fn normalize_media(media: Option<&str>) -> Option<&str> {
    media.map(str::trim).filter(|text| !text.is_empty())
}

/// Split a declaration block on top-level semicolons, ignoring those inside
/// quotes or parentheses. Parts are trimmed and empty parts dropped.
pub fn split_properties(properties: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0usize;
    for (offset, character) in properties.char_indices() {
        match (quote, character) {
            (Some(open), _) if character == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(character),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                parts.push(properties.get(start..offset).unwrap_or_default());
                start = offset + 1;
            }
            (None, _) => {}
        }
    }
    parts.push(properties.get(start..).unwrap_or_default());
    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Canonical selector text: clauses split on top-level commas and joined
/// with `", "`.
pub fn normalize_selector(selector: &str) -> String {
    split_selector_list(selector)
        .into_iter()
        .filter(|clause| !clause.is_empty())
        .map(css_syntax::collapse_whitespace)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_split_respects_quotes_and_functions() {
        assert_eq!(
            split_properties(" content: \"a;b\"; background: url(data:x;base64,AA) ;; color:red "),
            vec!["content: \"a;b\"", "background: url(data:x;base64,AA)", "color:red"]
        );
    }

    #[test]
    fn keys_treat_empty_media_as_none() {
        let rule = StyleRule::new(".a", "color: red;", Some(""));
        assert_eq!(rule.media, None);
        assert!(rule.has_key(".a", None));
        assert!(rule.has_key(".a", Some(" ")));
        assert!(!rule.has_key(".a", Some("@media print")));
    }

    #[test]
    fn selector_normalization() {
        assert_eq!(normalize_selector("h1,h2 >  a ,  .x"), "h1, h2 > a, .x");
        let rule = StyleRule::new("a:hover, b, .c:hover span", "", None);
        assert_eq!(rule.hover_clauses(), vec!["a:hover", ".c:hover span"]);
    }
}
