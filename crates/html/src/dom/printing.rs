//! HTML serialization and a debug tree printer.
//! Spec: <https://html.spec.whatwg.org/multipage/parsing.html#serialising-html-fragments>

use core::fmt;

use super::{Document, NodeKind};
use indextree::NodeId;

/// Elements that never have an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose text children are emitted without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "iframe",
    "noembed",
    "noframes",
    "plaintext",
    "script",
    "style",
    "xmp",
];

fn escape_text(text: &str, out: &mut String) {
    for character in text.chars() {
        match character {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for character in value.chars() {
        match character {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
}

impl Document {
    /// Markup for the node itself and its subtree.
    pub fn outer_html(&self, id: NodeId) -> String {
        self.outer_html_excluding_classes(id, &[])
    }

    /// Markup for the node's children.
    pub fn inner_html(&self, id: NodeId) -> String {
        self.inner_html_excluding_classes(id, &[])
    }

    /// Like [`Document::outer_html`], but leaves the given class tokens out
    /// of every `class` attribute. An attribute left empty is omitted.
    pub fn outer_html_excluding_classes(&self, id: NodeId, excluded: &[&str]) -> String {
        let mut out = String::new();
        self.write_node(id, excluded, &mut out);
        out
    }

    /// Like [`Document::inner_html`], with class tokens filtered as in
    /// [`Document::outer_html_excluding_classes`].
    pub fn inner_html_excluding_classes(&self, id: NodeId, excluded: &[&str]) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_node(child, excluded, &mut out);
        }
        out
    }

    /// The whole document, starting with an HTML5 doctype.
    pub fn to_html(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>");
        if let Some(html) = self.document_element() {
            out.push('\n');
            self.write_node(html, &[], &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, excluded: &[&str], out: &mut String) {
        let Some(kind) = self.kind(id) else {
            return;
        };
        match kind {
            NodeKind::Document => {
                for child in self.children(id) {
                    self.write_node(child, excluded, out);
                }
            }
            NodeKind::Element { tag } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in self.attrs(id) {
                    let filtered;
                    let value = if name == "class" && !excluded.is_empty() {
                        filtered = value
                            .split_ascii_whitespace()
                            .filter(|token| !excluded.contains(token))
                            .collect::<Vec<_>>()
                            .join(" ");
                        if filtered.is_empty() {
                            continue;
                        }
                        filtered.as_str()
                    } else {
                        value.as_str()
                    };
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_attr(value, out);
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for child in self.children(id) {
                    self.write_node(child, excluded, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
            NodeKind::Text { text } => {
                let raw_parent = self
                    .parent(id)
                    .and_then(|parent| self.tag_name(parent))
                    .is_some_and(|tag| RAW_TEXT_ELEMENTS.contains(&tag));
                if raw_parent {
                    out.push_str(text);
                } else {
                    escape_text(text, out);
                }
            }
            NodeKind::Comment { text } => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
        }
    }

    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match self.kind(id) {
            Some(NodeKind::Document) => writeln!(f, "{indent}#document")?,
            Some(NodeKind::Element { tag }) => {
                write!(f, "{indent}<{tag}")?;
                for (name, value) in self.attrs(id) {
                    write!(f, " {name}=\"{value}\"")?;
                }
                writeln!(f, ">")?;
            }
            Some(NodeKind::Text { text }) => {
                if text.trim().is_empty() {
                    return Ok(());
                }
                writeln!(f, "{indent}\"{}\"", text.trim())?;
            }
            Some(NodeKind::Comment { text }) => writeln!(f, "{indent}<!--{text}-->")?,
            None => return Ok(()),
        }
        for child in self.children(id) {
            self.fmt_node(f, child, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(f, self.root, 0)
    }
}
