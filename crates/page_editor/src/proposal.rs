//! Turning externally proposed edits into commands.
//!
//! A proposal arrives as JSON, possibly wrapped in markdown code fences.
//! It is sanitized, compared with the context it was generated from, and
//! converted into the commands that realise it.

use css::StyleRule;
use serde::{Deserialize, Serialize};

use crate::command::{
    Action, ChangeScript, ReconcileRules, ReplaceDocument, ReplaceStylesheet, ReplaceSubtree,
};
use crate::workspace::Workspace;

/// Remove markdown code fences (with any language tag) and trim.
pub fn strip_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("```") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 3..];
        let tag_len = after
            .find(|ch: char| !ch.is_ascii_alphanumeric())
            .unwrap_or(after.len());
        let tail = &after[tag_len..];
        rest = tail
            .strip_prefix("\r\n")
            .or_else(|| tail.strip_prefix('\n'))
            .unwrap_or(tail);
    }
    out.push_str(rest);
    out.trim().to_owned()
}

/// What an edit proposer was shown about the selected element.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditContext {
    pub element_id: String,
    /// Outer markup of the element, marker classes removed.
    pub html: String,
    /// Rules matching the element.
    pub css: Vec<StyleRule>,
    pub javascript: String,
}

impl EditContext {
    /// The context rules as stylesheet text.
    pub fn css_text(&self) -> String {
        css::generate_rules(&self.css)
    }
}

/// A proposed replacement for one element, its rules and the page script.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct EditProposal {
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub css: Vec<StyleRule>,
    #[serde(default)]
    pub javascript: Option<String>,
}

impl EditProposal {
    /// Parse and sanitize a proposal.
    ///
    /// # Errors
    /// Returns an error if the text is not a proposal object.
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let proposal: Self = serde_json::from_str(&strip_fences(text))?;
        Ok(proposal.sanitized())
    }

    /// Strip code fences from every field and drop rules without a selector.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let css = self
            .css
            .into_iter()
            .filter_map(|rule| {
                let selector = rule.selector.trim();
                if selector.is_empty() {
                    return None;
                }
                Some(StyleRule::new(
                    selector,
                    &strip_fences(&rule.properties),
                    rule.media.as_deref(),
                ))
            })
            .collect();
        Self {
            html: strip_fences(&self.html),
            css,
            javascript: self.javascript.as_deref().map(strip_fences),
        }
    }

    /// Commands realising the proposal against `context`: a subtree
    /// replacement when the markup changed, a rule reconciliation when the
    /// rules changed, and a script change when the script changed.
    pub fn into_actions(self, context: &EditContext) -> Vec<Action> {
        let mut actions = Vec::new();
        if !self.html.is_empty() && self.html != context.html.trim() {
            actions.push(
                ReplaceSubtree::new(&context.element_id, &context.html, &self.html).into(),
            );
        }
        if self.css != context.css {
            actions.push(ReconcileRules::new(context.css.clone(), self.css).into());
        }
        if let Some(javascript) = self.javascript
            && javascript != context.javascript.trim()
        {
            actions.push(ChangeScript::new(&context.javascript, &javascript).into());
        }
        actions
    }
}

/// A proposed replacement for the whole page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PageProposal {
    pub html: String,
    #[serde(default)]
    pub css: String,
    #[serde(default)]
    pub javascript: Option<String>,
}

impl PageProposal {
    /// Parse and sanitize a page proposal.
    ///
    /// # Errors
    /// Returns an error if the text is not a page proposal object.
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let proposal: Self = serde_json::from_str(&strip_fences(text))?;
        Ok(Self {
            html: strip_fences(&proposal.html),
            css: strip_fences(&proposal.css),
            javascript: proposal.javascript.as_deref().map(strip_fences),
        })
    }

    /// Commands replacing the page body, stylesheet and script wherever
    /// they differ from the workspace.
    pub fn into_actions(self, workspace: &Workspace) -> Vec<Action> {
        let mut actions = Vec::new();
        let current_markup = workspace.page_markup();
        if !self.html.is_empty() && self.html != current_markup {
            actions.push(ReplaceDocument::new(&current_markup, &self.html).into());
        }
        let current_css = workspace.stylesheet().current_text();
        if self.css != current_css {
            actions.push(ReplaceStylesheet::new(&current_css, &self.css).into());
        }
        if let Some(javascript) = self.javascript
            && javascript != workspace.script().text
        {
            actions.push(ChangeScript::new(&workspace.script().text, &javascript).into());
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_are_removed() {
        assert_eq!(strip_fences("```html\n<p>x</p>\n```"), "<p>x</p>");
        assert_eq!(strip_fences("```js\nrun();```"), "run();");
        assert_eq!(strip_fences("  plain  "), "plain");
        assert_eq!(strip_fences("a ``` b"), "a  b");
    }

    #[test]
    fn proposal_json_is_sanitized() {
        let proposal = EditProposal::from_json(
            "```json\n{\"html\": \"```html\\n<p>y</p>\\n```\", \"css\": [{\"selector\": \" .a \", \"properties\": \"color: blue;\"}, {\"selector\": \"\", \"properties\": \"x: y;\"}]}\n```",
        )
        .unwrap();
        assert_eq!(proposal.html, "<p>y</p>");
        assert_eq!(proposal.css, [StyleRule::new(".a", "color: blue;", None)]);
        assert_eq!(proposal.javascript, None);
        assert!(EditProposal::from_json("not json").is_err());
    }

    #[test]
    fn only_changed_parts_become_actions() {
        let context = EditContext {
            element_id: "edit-2".into(),
            html: "<p data-edit-id=\"edit-2\">x</p>".into(),
            css: vec![StyleRule::new("p", "color: red;", None)],
            javascript: "run();".into(),
        };
        let unchanged = EditProposal {
            html: context.html.clone(),
            css: context.css.clone(),
            javascript: Some("run();".into()),
        };
        assert!(unchanged.into_actions(&context).is_empty());

        let changed = EditProposal {
            html: "<p>y</p>".into(),
            css: vec![],
            javascript: Some("stop();".into()),
        };
        let actions = changed.into_actions(&context);
        assert_eq!(actions.len(), 3);
        assert!(matches!(actions[0], Action::ReplaceSubtree(_)));
        assert!(matches!(actions[1], Action::ReconcileRules(_)));
        assert!(matches!(actions[2], Action::ChangeScript(_)));
        assert_eq!(context.css_text(), "p {\n    color: red;\n}");
    }
}
