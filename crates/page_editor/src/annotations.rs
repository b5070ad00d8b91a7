//! Annotation comments attached to elements.
//!
//! A note is a comment whose text starts with the configured marker. It
//! belongs to the element right after it (`Above`), or failing that to the
//! element right before it (`Below`); whitespace-only text in between is
//! ignored. Each element keeps the first note found for it.

use std::collections::BTreeMap;

use html::{Document, NodeId};
use serde::{Deserialize, Serialize};

use crate::identity::IdentityAssignor;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotePosition {
    Above,
    Below,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Annotation {
    pub comment: NodeId,
    pub position: NotePosition,
}

/// Comment text for a note.
pub fn format_note(marker: &str, text: &str) -> String {
    format!(" {marker} {} ", text.trim())
}

#[derive(Clone, Debug)]
pub struct AnnotationIndex {
    marker: String,
    by_identifier: BTreeMap<String, Annotation>,
}

impl AnnotationIndex {
    pub fn new(marker: &str) -> Self {
        Self {
            marker: marker.to_owned(),
            by_identifier: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn is_note(&self, document: &Document, node: NodeId) -> bool {
        document
            .comment_text(node)
            .is_some_and(|text| text.trim_start().starts_with(self.marker.as_str()))
    }

    /// Rebuild the index from the notes found under `root`.
    pub fn scan(&mut self, identity: &IdentityAssignor, document: &Document, root: NodeId) {
        self.by_identifier.clear();
        for node in document.descendants(root) {
            if !self.is_note(document, node) {
                continue;
            }
            let target = significant_sibling(document, node, Direction::Forward)
                .filter(|&next| document.is_element(next))
                .map(|element| (element, NotePosition::Above))
                .or_else(|| {
                    significant_sibling(document, node, Direction::Backward)
                        .filter(|&previous| document.is_element(previous))
                        .map(|element| (element, NotePosition::Below))
                });
            let Some((element, position)) = target else {
                log::trace!("note {node:?} has no adjacent element");
                continue;
            };
            let Some(identifier) = identity.identifier_of(document, element) else {
                continue;
            };
            self.by_identifier
                .entry(identifier.to_owned())
                .or_insert(Annotation {
                    comment: node,
                    position,
                });
        }
        log::trace!("annotation scan found {} notes", self.by_identifier.len());
    }

    pub fn get(&self, identifier: &str) -> Option<Annotation> {
        self.by_identifier.get(identifier).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.by_identifier.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_identifier.is_empty()
    }

    /// The note text attached to `identifier`, marker removed.
    pub fn note_text(&self, document: &Document, identifier: &str) -> Option<String> {
        let annotation = self.get(identifier)?;
        let text = document.comment_text(annotation.comment)?.trim();
        Some(
            text.strip_prefix(self.marker.as_str())
                .unwrap_or(text)
                .trim()
                .to_owned(),
        )
    }

    /// The nodes that travel with `element`: its `Above` note and the
    /// whitespace after it, the element, its `Below` note with the
    /// whitespace before it, then one trailing whitespace text node.
    pub fn sibling_run(
        &self,
        identity: &IdentityAssignor,
        document: &Document,
        element: NodeId,
    ) -> Vec<NodeId> {
        let annotation = identity
            .identifier_of(document, element)
            .and_then(|identifier| self.get(identifier));
        let mut run = Vec::new();

        if let Some(Annotation {
            comment,
            position: NotePosition::Above,
        }) = annotation
        {
            let mut cursor = Some(comment);
            while let Some(node) = cursor {
                if node == element {
                    break;
                }
                run.push(node);
                cursor = document.next_sibling(node);
            }
        }
        run.push(element);

        let mut last = element;
        if let Some(Annotation {
            comment,
            position: NotePosition::Below,
        }) = annotation
        {
            let mut between = Vec::new();
            let mut cursor = document.next_sibling(element);
            while let Some(node) = cursor {
                between.push(node);
                if node == comment {
                    run.append(&mut between);
                    last = comment;
                    break;
                }
                if !document.is_whitespace_text(node) {
                    break;
                }
                cursor = document.next_sibling(node);
            }
        }
        if let Some(trailing) = document.next_sibling(last)
            && document.is_whitespace_text(trailing)
        {
            run.push(trailing);
        }
        run
    }

    /// First node of the element's run.
    pub fn run_start(&self, identity: &IdentityAssignor, document: &Document, element: NodeId) -> NodeId {
        identity
            .identifier_of(document, element)
            .and_then(|identifier| self.get(identifier))
            .filter(|annotation| {
                annotation.position == NotePosition::Above
                    && document.parent(annotation.comment) == document.parent(element)
            })
            .map_or(element, |annotation| annotation.comment)
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

/// Nearest sibling that is not whitespace-only text.
fn significant_sibling(document: &Document, node: NodeId, direction: Direction) -> Option<NodeId> {
    let step = |current: NodeId| match direction {
        Direction::Forward => document.next_sibling(current),
        Direction::Backward => document.previous_sibling(current),
    };
    let mut cursor = step(node);
    while let Some(candidate) = cursor {
        if !document.is_whitespace_text(candidate) {
            return Some(candidate);
        }
        cursor = step(candidate);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(markup: &str) -> (Document, IdentityAssignor, AnnotationIndex, NodeId) {
        let mut doc = Document::parse(markup).unwrap();
        let body = doc.body().unwrap();
        let mut identity = IdentityAssignor::new("data-edit-id", "edit-");
        identity.assign_identifiers_to_subtree(&mut doc, body);
        let mut notes = AnnotationIndex::new("EDIT_NOTE:");
        notes.scan(&identity, &doc, body);
        (doc, identity, notes, body)
    }

    #[test]
    fn notes_attach_above_then_below() {
        let (doc, _, notes, _) = setup(
            "<h1>t</h1>\n<!-- EDIT_NOTE: intro -->\n<p>a</p>\n<div>b</div>\n<!-- EDIT_NOTE: tail -->\n<!-- plain -->",
        );
        assert_eq!(notes.len(), 2);
        assert_eq!(notes.get("edit-3").map(|a| a.position), Some(NotePosition::Above));
        assert_eq!(notes.get("edit-4").map(|a| a.position), Some(NotePosition::Below));
        assert_eq!(notes.note_text(&doc, "edit-3").as_deref(), Some("intro"));
        assert!(notes.get("edit-2").is_none());
    }

    #[test]
    fn first_note_wins() {
        let (doc, _, notes, _) =
            setup("<main><!-- EDIT_NOTE: one --><p>a</p><!-- EDIT_NOTE: two --></main>");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes.note_text(&doc, "edit-3").as_deref(), Some("one"));
    }

    #[test]
    fn notes_need_an_adjacent_element() {
        let (_, _, notes, _) =
            setup("<main><!-- EDIT_NOTE: one --><!-- EDIT_NOTE: two --></main>");
        assert!(notes.is_empty());
    }

    #[test]
    fn runs_carry_notes_and_trailing_whitespace() {
        let (doc, identity, notes, body) = setup(
            "<main>\n<!-- EDIT_NOTE: n -->\n<p>a</p>\n<div>b</div>\n<!-- EDIT_NOTE: m -->\n<span>c</span></main>",
        );
        let main = doc.element_children(body)[0];
        let elements = doc.element_children(main);
        let (para, div, span) = (elements[0], elements[1], elements[2]);

        let para_run = notes.sibling_run(&identity, &doc, para);
        assert_eq!(para_run.len(), 4);
        assert!(doc.comment_text(para_run[0]).is_some());
        assert_eq!(notes.run_start(&identity, &doc, para), para_run[0]);

        // The second note sits before <span>, so it is an Above note there.
        let div_run = notes.sibling_run(&identity, &doc, div);
        assert_eq!(div_run.len(), 2);
        assert_eq!(div_run[0], div);
        let span_run = notes.sibling_run(&identity, &doc, span);
        assert_eq!(span_run.len(), 3);
        assert_eq!(notes.run_start(&identity, &doc, span), span_run[0]);
    }

    #[test]
    fn below_note_run() {
        let (doc, identity, notes, body) = setup("<p>a</p> <!-- EDIT_NOTE: m --> ");
        let para = doc.element_children(body)[0];
        let run = notes.sibling_run(&identity, &doc, para);
        let markup: String = run.iter().map(|&node| doc.outer_html(node)).collect();
        assert_eq!(markup, "<p data-edit-id=\"edit-2\">a</p> <!-- EDIT_NOTE: m --> ");
        assert_eq!(format_note("EDIT_NOTE:", " hi "), " EDIT_NOTE: hi ");
    }
}
