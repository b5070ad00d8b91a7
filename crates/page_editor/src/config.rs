//! Configuration settings for the page editor.
//!
//! This module defines the history bound, the identity attribute naming and
//! the transient marker classes the editor paints onto the document.
//! Configuration can be loaded from environment variables, embedded in a
//! JSON settings document, or constructed programmatically.

use std::env;

use serde::{Deserialize, Serialize};

/// Default number of undo entries retained.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Runtime configuration for an editing session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of undo entries; the oldest entry is evicted first
    pub history_limit: usize,
    /// Attribute carrying each element's stable identifier
    pub identity_attribute: String,
    /// Prefix of allocated identifiers, followed by a decimal counter
    pub identity_prefix: String,
    /// Marker class painted on the selected element
    pub selected_class: String,
    /// Marker class that simulates `:hover` on the selected element
    pub hover_class: String,
    /// Leading text that turns a comment into an annotation
    pub note_marker: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl EditorConfig {
    /// Construct a configuration with the given history bound and default
    /// naming.
    ///
    /// # Arguments
    ///
    /// * `history_limit` - Maximum number of undo entries (minimum 1)
    ///
    /// # Returns
    ///
    /// A new `EditorConfig` instance with the specified settings
    #[inline]
    #[must_use]
    pub fn new(history_limit: usize) -> Self {
        Self {
            history_limit: history_limit.max(1),
            identity_attribute: String::from("data-edit-id"),
            identity_prefix: String::from("edit-"),
            selected_class: String::from("editor-selected"),
            hover_class: String::from("editor-hover"),
            note_marker: String::from("EDIT_NOTE:"),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `PAGE_EDITOR_HISTORY_LIMIT`: Undo bound (default: 100, minimum 1)
    /// - `PAGE_EDITOR_ID_ATTRIBUTE`: Identity attribute (default: `data-edit-id`)
    /// - `PAGE_EDITOR_ID_PREFIX`: Identifier prefix (default: `edit-`)
    /// - `PAGE_EDITOR_SELECTED_CLASS`: Selection marker class
    /// - `PAGE_EDITOR_HOVER_CLASS`: Hover simulation marker class
    /// - `PAGE_EDITOR_NOTE_MARKER`: Annotation comment marker
    ///
    /// # Returns
    ///
    /// A new `EditorConfig` instance populated from environment variables
    #[inline]
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source. Unset,
    /// blank or unparsable values fall back to the defaults.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str, fallback: String| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
                .unwrap_or(fallback)
        };
        let history_limit = lookup("PAGE_EDITOR_HISTORY_LIMIT")
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(defaults.history_limit)
            .max(1);
        Self {
            history_limit,
            identity_attribute: text("PAGE_EDITOR_ID_ATTRIBUTE", defaults.identity_attribute),
            identity_prefix: text("PAGE_EDITOR_ID_PREFIX", defaults.identity_prefix),
            selected_class: text("PAGE_EDITOR_SELECTED_CLASS", defaults.selected_class),
            hover_class: text("PAGE_EDITOR_HOVER_CLASS", defaults.hover_class),
            note_marker: text("PAGE_EDITOR_NOTE_MARKER", defaults.note_marker),
        }
    }

    /// Parse a JSON settings object; missing fields take their defaults.
    ///
    /// # Errors
    /// Returns an error if `text` is not a valid settings object.
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let mut config: Self = serde_json::from_str(text)?;
        config.history_limit = config.history_limit.max(1);
        Ok(config)
    }

    /// Classes the editor adds to the document and strips from captured
    /// markup and baselines.
    #[inline]
    #[must_use]
    pub fn marker_classes(&self) -> [&str; 2] {
        [self.selected_class.as_str(), self.hover_class.as_str()]
    }

    /// Stylesheet for the editor's own chrome inside the preview.
    #[must_use]
    pub fn chrome_css(&self) -> String {
        format!(
            ".{} {{\n    outline: 2px dashed #384d68 !important;\n    outline-offset: 2px;\n}}\n\na {{\n    pointer-events: none;\n}}",
            self.selected_class
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.history_limit, 100);
        assert_eq!(config.identity_attribute, "data-edit-id");
        assert_eq!(config.marker_classes(), ["editor-selected", "editor-hover"]);
        assert_eq!(EditorConfig::new(0).history_limit, 1);
    }

    #[test]
    fn lookup_overrides_and_fallbacks() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("PAGE_EDITOR_HISTORY_LIMIT", "25"),
            ("PAGE_EDITOR_ID_PREFIX", "n2l-"),
            ("PAGE_EDITOR_HOVER_CLASS", "  "),
        ]);
        let config = EditorConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_owned()));
        assert_eq!(config.history_limit, 25);
        assert_eq!(config.identity_prefix, "n2l-");
        assert_eq!(config.hover_class, "editor-hover");

        let zero = EditorConfig::from_lookup(|key| {
            (key == "PAGE_EDITOR_HISTORY_LIMIT").then(|| "0".to_owned())
        });
        assert_eq!(zero.history_limit, 1);
        let junk = EditorConfig::from_lookup(|_| Some("many".to_owned()));
        assert_eq!(junk.history_limit, 100);
    }

    #[test]
    fn json_settings_use_field_defaults() {
        let config = EditorConfig::from_json(r#"{"history_limit": 5, "note_marker": "NOTE:"}"#)
            .unwrap();
        assert_eq!(config.history_limit, 5);
        assert_eq!(config.note_marker, "NOTE:");
        assert_eq!(config.selected_class, "editor-selected");
        assert!(EditorConfig::from_json("[1, 2]").is_err());
    }
}
