//! Parsing markup into a [`Document`].

mod html5ever_engine;

use crate::dom::Document;
use anyhow::{Result, anyhow};
use html5ever::tendril::TendrilSink as _;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{LocalName, ParseOpts, QualName, ns, parse_document, parse_fragment};
use indextree::NodeId;
use markup5ever_rcdom::RcDom;

fn parse_opts() -> ParseOpts {
    ParseOpts {
        tree_builder: TreeBuilderOpts {
            exact_errors: false,
            scripting_enabled: false,
            ..TreeBuilderOpts::default()
        },
        ..ParseOpts::default()
    }
}

fn parse_rcdom(markup: &str) -> Result<RcDom> {
    let dom = parse_document(RcDom::default(), parse_opts())
        .from_utf8()
        .read_from(&mut markup.as_bytes())?;
    Ok(dom)
}

impl Document {
    /// Parse a complete document. Missing `<html>`, `<head>` and `<body>`
    /// elements are synthesized the way browsers do.
    ///
    /// # Errors
    /// Returns an error if the input stream cannot be read.
    pub fn parse(markup: &str) -> Result<Self> {
        let rcdom = parse_rcdom(markup)?;
        let mut document = Self::new();
        let root = document.root();
        html5ever_engine::import_children(&mut document, &rcdom.document, root)?;
        log::trace!(
            "parsed document with {} nodes",
            document.descendants(root).len()
        );
        Ok(document)
    }

    /// Parse markup in a `<body>` context, returning detached top-level
    /// nodes owned by this document.
    ///
    /// # Errors
    /// Returns an error if the input stream cannot be read.
    pub fn parse_fragment(&mut self, markup: &str) -> Result<Vec<NodeId>> {
        self.parse_fragment_in("body", markup)
    }

    /// Parse markup as the content of a `context` element, so that markup
    /// only valid inside tables, lists or selects keeps its elements.
    ///
    /// # Errors
    /// Returns an error if the input stream cannot be read.
    pub fn parse_fragment_in(&mut self, context: &str, markup: &str) -> Result<Vec<NodeId>> {
        let context_name = QualName::new(None, ns!(html), LocalName::from(context));
        let rcdom = parse_fragment(RcDom::default(), parse_opts(), context_name, Vec::new(), false)
            .from_utf8()
            .read_from(&mut markup.as_bytes())?;
        let root = html5ever_engine::find_fragment_root(&rcdom.document)
            .ok_or_else(|| anyhow!("fragment parse produced no root"))?;
        html5ever_engine::import_detached(self, &root)
    }

    /// Parse markup as children of the element `parent`, using its tag as
    /// the parsing context. Non-elements parse in a `<body>` context.
    ///
    /// # Errors
    /// Returns an error if the input stream cannot be read.
    pub fn parse_fragment_for(&mut self, parent: NodeId, markup: &str) -> Result<Vec<NodeId>> {
        let context = self.tag_name(parent).unwrap_or("body").to_owned();
        self.parse_fragment_in(&context, markup)
    }

    /// Replace the children of `id` with the parsed `markup`.
    ///
    /// # Errors
    /// Returns an error if parsing fails or `id` has been removed.
    pub fn set_inner_html(&mut self, id: NodeId, markup: &str) -> Result<()> {
        if self.node(id).is_none() {
            return Err(anyhow!("cannot set markup on a removed node"));
        }
        let nodes = self.parse_fragment_for(id, markup)?;
        self.remove_children(id);
        for node in nodes {
            self.append_child(id, node)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Document, NodeKind};

    #[test]
    fn synthesizes_document_structure() {
        let doc = Document::parse("<p>hello</p>").unwrap();
        let body = doc.body().unwrap();
        assert!(doc.head().is_some());
        assert_eq!(doc.inner_html(body), "<p>hello</p>");
        assert_eq!(
            doc.to_html(),
            "<!DOCTYPE html>\n<html><head></head><body><p>hello</p></body></html>"
        );
    }

    #[test]
    fn keeps_comments_whitespace_and_attribute_order() {
        let doc = Document::parse(
            "<body>\n  <!-- note -->\n  <a title=\"t\" href=\"/x\" class=\"c\">link</a>\n</body>",
        )
        .unwrap();
        let body = doc.body().unwrap();
        assert_eq!(
            doc.inner_html(body),
            "\n  <!-- note -->\n  <a title=\"t\" href=\"/x\" class=\"c\">link</a>\n"
        );
        let comment = doc.children(body)[1];
        assert_eq!(doc.kind(comment), Some(&NodeKind::Comment { text: " note ".into() }));
    }

    #[test]
    fn fragments_are_detached_and_reparentable() {
        let mut doc = Document::parse("<div id=\"host\"></div>").unwrap();
        let nodes = doc.parse_fragment("<b>one</b> two <i>three</i>").unwrap();
        assert_eq!(nodes.len(), 3);
        assert!(nodes.iter().all(|&node| doc.parent(node).is_none()));

        let host = doc.element_children(doc.body().unwrap())[0];
        doc.set_inner_html(host, "<span>x</span><span>y</span>").unwrap();
        assert_eq!(doc.inner_html(host), "<span>x</span><span>y</span>");
        assert_eq!(doc.text_content(host), "xy");
    }

    #[test]
    fn table_fragments_parse_in_their_context() {
        let mut doc = Document::parse("<table><tbody><tr><td>a</td></tr></tbody></table>").unwrap();
        let lost = doc.parse_fragment("<tr><td>b</td></tr>").unwrap();
        assert!(lost.iter().all(|&node| !doc.is_element(node)));

        let row = doc.parse_fragment_in("tbody", "<tr><td>b</td></tr>").unwrap();
        assert_eq!(row.len(), 1);
        assert_eq!(doc.outer_html(row[0]), "<tr><td>b</td></tr>");
        let cells = doc.parse_fragment_in("tr", "<td>c</td><th>d</th>").unwrap();
        assert_eq!(cells.len(), 2);

        let tbody = doc.descendant_elements(doc.body().unwrap())[2];
        assert_eq!(doc.tag_name(tbody), Some("tbody"));
        doc.set_inner_html(tbody, "<tr><td>x</td></tr>").unwrap();
        assert_eq!(doc.inner_html(tbody), "<tr><td>x</td></tr>");
    }
}
