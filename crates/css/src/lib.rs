//! Structured stylesheet model for a page editor.
//!
//! A stylesheet is held as an ordered list of [`StyleRule`]s rather than
//! text: it can be parsed, matched against an element (optionally
//! simulating `:hover`), edited rule by rule and regenerated canonically.
#![allow(
    clippy::missing_docs_in_private_items,
    reason = "Internal implementation details don't need public documentation"
)]
#![allow(
    clippy::missing_inline_in_public_items,
    reason = "Inlining decisions left to compiler for this crate"
)]

mod generate;
mod parser;
mod ruledb;
mod selector;
mod types;

pub use generate::generate_rules;
pub use parser::{declarations_text, parse_rules};
pub use ruledb::StylesheetModel;
pub use types::{
    HOVER_MARKER, RAW_SELECTOR, RuleMatch, StyleRule, normalize_media, normalize_selector,
    split_properties,
};
