//! Editable HTML document.
//!
//! Markup is parsed with html5ever into an `indextree` arena that supports
//! the tree edits a page editor performs (insert, move, clone, replace,
//! inner/outer markup) and serializes back to HTML.
#![allow(
    clippy::missing_docs_in_private_items,
    reason = "Internal implementation details don't need public documentation"
)]
#![allow(
    clippy::missing_inline_in_public_items,
    reason = "Inlining decisions left to compiler for this crate"
)]

pub mod dom;
pub mod parser;

pub use dom::{Document, DomNode, NodeKind};
pub use indextree::NodeId;
