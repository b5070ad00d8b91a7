//! CSS selector matching engine.
//! Spec: <https://www.w3.org/TR/selectors-4/>

use crate::{
    AttrOperator, Combinator, ComplexSelector, CompoundSelector, ElementAdapter, Nth, PseudoClass,
    SelectorList, SimpleSelector,
};

/// Elements that can carry the `disabled` attribute.
const FORM_ELEMENTS: &[&str] = &[
    "button", "fieldset", "input", "optgroup", "option", "select", "textarea",
];

/// Match a selector list against an element.
/// Spec: Section 3, 4
pub fn matches_selector_list<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    list: &SelectorList,
) -> bool {
    list.selectors
        .iter()
        .any(|selector_item| matches_complex(adapter, element, selector_item))
}

/// Match a complex selector against an element.
/// Spec: Section 3, 11 — Right-to-left matching strategy
pub fn matches_complex<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    sel: &ComplexSelector,
) -> bool {
    matches_from(adapter, element, sel, sel.rest.len())
}

/// Match the compound at `index` against `element`, then relate the
/// compounds to its left through their combinators. Descendant and general
/// sibling combinators backtrack over every candidate.
fn matches_from<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    sel: &ComplexSelector,
    index: usize,
) -> bool {
    let Some(compound) = sel.compound(index) else {
        return false;
    };
    if !matches_compound(adapter, element, compound) {
        return false;
    }
    let Some(left) = index.checked_sub(1) else {
        return true;
    };
    let Some(&(combinator, _)) = sel.rest.get(left) else {
        return false;
    };
    match combinator {
        Combinator::Descendant => {
            let mut current_parent = adapter.parent(element);
            while let Some(ancestor_element) = current_parent {
                if matches_from(adapter, ancestor_element, sel, left) {
                    return true;
                }
                current_parent = adapter.parent(ancestor_element);
            }
            false
        }
        Combinator::Child => adapter
            .parent(element)
            .is_some_and(|parent_el| matches_from(adapter, parent_el, sel, left)),
        Combinator::AdjacentSibling => adapter
            .previous_sibling_element(element)
            .is_some_and(|prev_el| matches_from(adapter, prev_el, sel, left)),
        Combinator::GeneralSibling => {
            let mut current_sibling = adapter.previous_sibling_element(element);
            while let Some(sibling_element) = current_sibling {
                if matches_from(adapter, sibling_element, sel, left) {
                    return true;
                }
                current_sibling = adapter.previous_sibling_element(sibling_element);
            }
            false
        }
    }
}

/// Match a compound selector against a single element.
/// Spec: Section 5–8
pub fn matches_compound<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    compound: &CompoundSelector,
) -> bool {
    compound
        .simples
        .iter()
        .all(|simple| matches_simple(adapter, element, simple))
}

fn matches_simple<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    simple: &SimpleSelector,
) -> bool {
    match simple {
        SimpleSelector::Universal => true,
        SimpleSelector::Type(type_name) => adapter.tag_name(element) == type_name.as_str(),
        SimpleSelector::Class(class_name) => adapter.has_class(element, class_name),
        SimpleSelector::IdSelector(id_value) => adapter
            .element_id(element)
            .is_some_and(|value| value == id_value.as_str()),
        SimpleSelector::Attribute { name, operator } => adapter
            .attr(element, name)
            .is_some_and(|value| matches_attribute(value, operator)),
        SimpleSelector::PseudoClass(pseudo) => matches_pseudo_class(adapter, element, pseudo),
        SimpleSelector::PseudoElement(_) => false,
    }
}

/// Spec: Section 6 — Attribute presence and value selectors
fn matches_attribute(value: &str, operator: &AttrOperator) -> bool {
    match operator {
        AttrOperator::Exists => true,
        AttrOperator::Equals(expected) => value == expected,
        AttrOperator::Includes(expected) => {
            !expected.is_empty()
                && !expected.contains(char::is_whitespace)
                && value.split_ascii_whitespace().any(|token| token == expected)
        }
        AttrOperator::DashMatch(expected) => {
            value == expected
                || value
                    .strip_prefix(expected.as_str())
                    .is_some_and(|tail| tail.starts_with('-'))
        }
        AttrOperator::Prefix(expected) => !expected.is_empty() && value.starts_with(expected.as_str()),
        AttrOperator::Suffix(expected) => !expected.is_empty() && value.ends_with(expected.as_str()),
        AttrOperator::Substring(expected) => !expected.is_empty() && value.contains(expected.as_str()),
    }
}

fn matches_pseudo_class<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    pseudo: &PseudoClass,
) -> bool {
    match pseudo {
        PseudoClass::FirstChild => adapter.previous_sibling_element(element).is_none(),
        PseudoClass::LastChild => adapter.next_sibling_element(element).is_none(),
        PseudoClass::OnlyChild => {
            adapter.previous_sibling_element(element).is_none()
                && adapter.next_sibling_element(element).is_none()
        }
        PseudoClass::NthChild(nth) => nth_matches(adapter, element, *nth, false, false),
        PseudoClass::NthLastChild(nth) => nth_matches(adapter, element, *nth, true, false),
        PseudoClass::NthOfType(nth) => nth_matches(adapter, element, *nth, false, true),
        PseudoClass::NthLastOfType(nth) => nth_matches(adapter, element, *nth, true, true),
        PseudoClass::OnlyOfType => {
            let only = Nth { step: 0, offset: 1 };
            nth_matches(adapter, element, only, false, true)
                && nth_matches(adapter, element, only, true, true)
        }
        PseudoClass::Empty => adapter.is_empty(element),
        PseudoClass::Root => adapter.parent(element).is_none(),
        PseudoClass::Not(compounds) => !compounds
            .iter()
            .any(|compound| matches_compound(adapter, element, compound)),
        PseudoClass::Checked => match adapter.tag_name(element) {
            "input" => adapter.attr(element, "checked").is_some(),
            "option" => adapter.attr(element, "selected").is_some(),
            _ => false,
        },
        PseudoClass::Disabled => {
            FORM_ELEMENTS.contains(&adapter.tag_name(element))
                && adapter.attr(element, "disabled").is_some()
        }
        PseudoClass::Enabled => {
            FORM_ELEMENTS.contains(&adapter.tag_name(element))
                && adapter.attr(element, "disabled").is_none()
        }
        PseudoClass::AnyLink => {
            matches!(adapter.tag_name(element), "a" | "area")
                && adapter.attr(element, "href").is_some()
        }
        PseudoClass::UserAction(_) => false,
    }
}

/// Compute the element's 1-based position among its siblings (optionally
/// only those of the same type, optionally counting from the end) and test
/// it against the formula.
fn nth_matches<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    nth: Nth,
    from_end: bool,
    same_type: bool,
) -> bool {
    let step = |handle: A::Handle| {
        if from_end {
            adapter.next_sibling_element(handle)
        } else {
            adapter.previous_sibling_element(handle)
        }
    };
    let tag = adapter.tag_name(element);
    let mut index = 1i32;
    let mut current = step(element);
    while let Some(sibling) = current {
        if !same_type || adapter.tag_name(sibling) == tag {
            index = index.saturating_add(1);
        }
        current = step(sibling);
    }
    nth.matches(index)
}
