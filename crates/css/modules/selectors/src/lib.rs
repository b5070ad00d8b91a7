//! Selectors Level 3/4 subset: parsing, element matching and specificity.
//! Spec: <https://www.w3.org/TR/selectors-4/>
//!
//! Covers what an editor needs to decide which authored rules apply to an
//! element in a static document:
//! - Type, universal, class, id and attribute selectors (all six operators)
//! - Structural pseudo-classes, `:not()` and a few element-state ones
//! - Combinators: descendant, child, adjacent sibling, general sibling
//! - Specificity calculation
//!
//! User-action pseudo-classes (`:hover`, `:focus`, ...) and pseudo-elements
//! parse but never match; a static tree has no interaction state.

mod matcher;
mod parser;
mod specificity;

pub use matcher::{matches_complex, matches_compound, matches_selector_list};
pub use parser::{parse_complex_selector, parse_selector_list, split_selector_list};
pub use specificity::{Specificity, specificity_of_complex, specificity_of_compound};

/// An adapter that abstracts DOM access for selector matching.
/// Implement this for your DOM layer.
pub trait ElementAdapter {
    type Handle: Copy + Eq;

    /// Parent element if any. The document node is not an element.
    fn parent(&self, element: Self::Handle) -> Option<Self::Handle>;

    /// Previous sibling element, skipping text and comment nodes.
    fn previous_sibling_element(&self, element: Self::Handle) -> Option<Self::Handle>;

    /// Next sibling element, skipping text and comment nodes.
    fn next_sibling_element(&self, element: Self::Handle) -> Option<Self::Handle>;

    /// Tag name in ASCII lowercase (per HTML parsing conventions).
    fn tag_name(&self, element: Self::Handle) -> &str;

    /// Returns Some(id) if the element has an id attribute, else None.
    fn element_id(&self, element: Self::Handle) -> Option<&str>;

    /// True if the element has the given class token.
    fn has_class(&self, element: Self::Handle, class: &str) -> bool;

    /// Returns the attribute value if present.
    fn attr(&self, element: Self::Handle, name: &str) -> Option<&str>;

    /// True if the element has no element or text children.
    fn is_empty(&self, element: Self::Handle) -> bool;
}

/// Attribute selector operators.
/// Spec: Section 6 — Attribute selectors
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrOperator {
    /// `[attr]`
    Exists,
    /// `[attr=value]`
    Equals(String),
    /// `[attr~=value]`
    Includes(String),
    /// `[attr|=value]`
    DashMatch(String),
    /// `[attr^=value]`
    Prefix(String),
    /// `[attr$=value]`
    Suffix(String),
    /// `[attr*=value]`
    Substring(String),
}

/// The `an+b` argument of `:nth-child()` and friends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Nth {
    pub step: i32,
    pub offset: i32,
}

impl Nth {
    /// True if the 1-based `index` is selected by this formula.
    pub fn matches(self, index: i32) -> bool {
        // Widened so extreme offsets and steps cannot overflow.
        let diff = i64::from(index) - i64::from(self.offset);
        let step = i64::from(self.step);
        if step == 0 {
            return diff == 0;
        }
        diff % step == 0 && diff / step >= 0
    }
}

/// Pseudo-classes understood by the matcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PseudoClass {
    FirstChild,
    LastChild,
    OnlyChild,
    NthChild(Nth),
    NthLastChild(Nth),
    NthOfType(Nth),
    NthLastOfType(Nth),
    OnlyOfType,
    Empty,
    Root,
    Not(Vec<CompoundSelector>),
    Checked,
    Disabled,
    Enabled,
    AnyLink,
    /// Interaction state such as `hover` or `focus`. Never matches.
    UserAction(String),
}

/// Simple selectors.
/// Spec: Section 5, 6, 7, 8
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimpleSelector {
    /// Spec: Section 5 — Type selectors
    Type(String),
    /// Spec: Section 5 — Universal selector
    Universal,
    /// Spec: Section 6 — Class selectors
    Class(String),
    /// Spec: Section 7 — ID selectors
    IdSelector(String),
    /// Spec: Section 8 — Attribute selectors
    Attribute { name: String, operator: AttrOperator },
    PseudoClass(PseudoClass),
    /// `::before`, `::marker`, ... Never matches an element.
    PseudoElement(String),
}

/// A compound selector is a sequence of simple selectors (no combinators).
/// Spec: Section 5 — Simple selector sequences
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    pub simples: Vec<SimpleSelector>,
}

/// Combinators between compounds.
/// Spec: Section 11 — Combinators
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

/// A complex selector is one or more compounds separated by combinators.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ComplexSelector {
    pub first: CompoundSelector,
    pub rest: Vec<(Combinator, CompoundSelector)>,
}

impl ComplexSelector {
    /// The compound at `index`, counting the leftmost as zero.
    pub fn compound(&self, index: usize) -> Option<&CompoundSelector> {
        if index == 0 {
            return Some(&self.first);
        }
        self.rest.get(index - 1).map(|pair| &pair.1)
    }
}

/// A selector list separated by commas.
/// Spec: Section 4 — Groups of selectors
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}
