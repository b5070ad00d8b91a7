//! Conversion from html5ever's reference-counted tree into the arena.

use crate::dom::{Document, DomNode, NodeKind};
use anyhow::Result;
use indextree::NodeId;
use markup5ever_rcdom::{Handle, NodeData};
use smallvec::SmallVec;

/// Convert one rcdom node into a detached arena node, recursing into
/// children. Doctypes and processing instructions are skipped.
fn import_node(document: &mut Document, handle: &Handle) -> Result<Option<NodeId>> {
    let data = match &handle.data {
        NodeData::Element { name, attrs, .. } => {
            let attrs: SmallVec<(String, String), 4> = attrs
                .borrow()
                .iter()
                .map(|attr| {
                    let local = attr.name.local.to_string();
                    let key = match &attr.name.prefix {
                        Some(prefix) => format!("{prefix}:{local}"),
                        None => local,
                    };
                    (key, attr.value.to_string())
                })
                .collect();
            DomNode {
                kind: NodeKind::Element {
                    tag: name.local.to_string(),
                },
                attrs,
            }
        }
        NodeData::Text { contents } => DomNode::text(&contents.borrow()),
        NodeData::Comment { contents } => DomNode::comment(contents),
        NodeData::Document | NodeData::Doctype { .. } | NodeData::ProcessingInstruction { .. } => {
            return Ok(None);
        }
    };
    let id = document.create_node(data);
    import_children(document, handle, id)?;
    if let NodeData::Element {
        template_contents, ..
    } = &handle.data
    {
        if let Some(contents) = template_contents.borrow().as_ref() {
            import_children(document, contents, id)?;
        }
    }
    Ok(Some(id))
}

/// Import every child of `handle` and append it to `parent`.
pub(super) fn import_children(
    document: &mut Document,
    handle: &Handle,
    parent: NodeId,
) -> Result<()> {
    for child in handle.children.borrow().iter() {
        if let Some(id) = import_node(document, child)? {
            document.append_child(parent, id)?;
        }
    }
    Ok(())
}

/// Import the children of `handle` as detached nodes.
pub(super) fn import_detached(document: &mut Document, handle: &Handle) -> Result<Vec<NodeId>> {
    let mut nodes = Vec::new();
    for child in handle.children.borrow().iter() {
        if let Some(id) = import_node(document, child)? {
            nodes.push(id);
        }
    }
    Ok(nodes)
}

/// The synthetic `<html>` element holding a parsed fragment's nodes.
pub(super) fn find_fragment_root(document: &Handle) -> Option<Handle> {
    document
        .children
        .borrow()
        .iter()
        .find(|child| matches!(&child.data, NodeData::Element { name, .. } if &*name.local == "html"))
        .cloned()
}
