//! Matching against a small in-memory element tree.

use css_selectors::{
    ElementAdapter, Specificity, matches_selector_list, parse_complex_selector,
    parse_selector_list, specificity_of_complex,
};

struct Element {
    tag: &'static str,
    parent: Option<usize>,
    attrs: Vec<(&'static str, &'static str)>,
    has_text: bool,
}

struct Tree {
    elements: Vec<Element>,
}

impl Tree {
    fn siblings(&self, element: usize) -> Vec<usize> {
        let parent = self.elements[element].parent;
        (0..self.elements.len())
            .filter(|&index| self.elements[index].parent == parent)
            .collect()
    }

    fn sibling_at(&self, element: usize, delta: isize) -> Option<usize> {
        let siblings = self.siblings(element);
        let position = siblings.iter().position(|&index| index == element)?;
        let target = position.checked_add_signed(delta)?;
        siblings.get(target).copied()
    }
}

impl ElementAdapter for Tree {
    type Handle = usize;

    fn parent(&self, element: usize) -> Option<usize> {
        self.elements[element].parent
    }

    fn previous_sibling_element(&self, element: usize) -> Option<usize> {
        self.sibling_at(element, -1)
    }

    fn next_sibling_element(&self, element: usize) -> Option<usize> {
        self.sibling_at(element, 1)
    }

    fn tag_name(&self, element: usize) -> &str {
        self.elements[element].tag
    }

    fn element_id(&self, element: usize) -> Option<&str> {
        self.attr(element, "id")
    }

    fn has_class(&self, element: usize, class: &str) -> bool {
        self.attr(element, "class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|token| token == class))
    }

    fn attr(&self, element: usize, name: &str) -> Option<&str> {
        self.elements[element]
            .attrs
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }

    fn is_empty(&self, element: usize) -> bool {
        !self.elements[element].has_text
            && !self
                .elements
                .iter()
                .any(|candidate| candidate.parent == Some(element))
    }
}

fn element(
    tag: &'static str,
    parent: Option<usize>,
    attrs: Vec<(&'static str, &'static str)>,
) -> Element {
    Element {
        tag,
        parent,
        attrs,
        has_text: false,
    }
}

/// html > body > (nav#top.menu > (a.link[href] x3), p.note "text", div)
fn sample_tree() -> Tree {
    let mut elements = vec![
        element("html", None, vec![]),
        element("body", Some(0), vec![]),
        element("nav", Some(1), vec![("id", "top"), ("class", "menu Wide")]),
        element("a", Some(2), vec![("class", "link"), ("href", "/a"), ("lang", "en-US")]),
        element("a", Some(2), vec![("class", "link active"), ("href", "https://x")]),
        element("a", Some(2), vec![("class", "link")]),
        element("p", Some(1), vec![("class", "note")]),
        element("div", Some(1), vec![]),
    ];
    elements[6].has_text = true;
    Tree { elements }
}

fn matches(tree: &Tree, element: usize, selector: &str) -> bool {
    let list = parse_selector_list(selector).unwrap();
    matches_selector_list(tree, element, &list)
}

#[test]
fn combinators_backtrack_over_ancestors_and_siblings() {
    let tree = sample_tree();
    assert!(matches(&tree, 4, "body nav > a"));
    assert!(matches(&tree, 4, "html a.active"));
    assert!(matches(&tree, 4, "a + a.active"));
    assert!(matches(&tree, 5, "a.active ~ a"));
    assert!(!matches(&tree, 3, "a ~ a"));
    assert!(matches(&tree, 7, "nav ~ div"));
    assert!(!matches(&tree, 7, "nav + div"));
    assert!(!matches(&tree, 3, "body > a"));
}

#[test]
fn classes_are_case_sensitive() {
    let tree = sample_tree();
    assert!(matches(&tree, 2, ".Wide"));
    assert!(!matches(&tree, 2, ".wide"));
    assert!(matches(&tree, 2, "NAV#top"));
}

#[test]
fn attribute_operators_match() {
    let tree = sample_tree();
    assert!(matches(&tree, 4, "a[href^=https]"));
    assert!(matches(&tree, 3, "a[href$='/a']"));
    assert!(matches(&tree, 3, "[lang|=en]"));
    assert!(matches(&tree, 4, "[class~=active]"));
    assert!(matches(&tree, 4, "[href*='://']"));
    assert!(!matches(&tree, 5, "a[href]"));
}

#[test]
fn structural_pseudo_classes() {
    let tree = sample_tree();
    assert!(matches(&tree, 3, "a:first-child"));
    assert!(matches(&tree, 5, "a:last-child"));
    assert!(matches(&tree, 4, "a:nth-child(2)"));
    assert!(matches(&tree, 5, "a:nth-child(odd)"));
    assert!(matches(&tree, 3, "a:nth-last-child(3)"));
    assert!(matches(&tree, 6, "p:only-of-type"));
    assert!(matches(&tree, 7, "div:empty"));
    assert!(!matches(&tree, 6, "p:empty"));
    assert!(matches(&tree, 0, ":root"));
    assert!(matches(&tree, 5, "a:not(.active, [href])"));
    assert!(!matches(&tree, 4, "a:not(.active)"));
    assert!(matches(&tree, 3, "a:any-link"));
}

#[test]
fn interaction_state_never_matches() {
    let tree = sample_tree();
    assert!(!matches(&tree, 3, "a:hover"));
    assert!(!matches(&tree, 3, "a::before"));
    assert!(matches(&tree, 3, "a:hover, .link"));
}

#[test]
fn specificity_counts() {
    let spec = |text: &str| specificity_of_complex(&parse_complex_selector(text).unwrap());
    assert_eq!(spec("nav#top > a.link:hover"), Specificity(1, 2, 2));
    assert_eq!(spec("*"), Specificity(0, 0, 0));
    assert_eq!(spec("a:not(#x, .y)"), Specificity(1, 0, 1));
    assert_eq!(spec("[href]::before"), Specificity(0, 1, 1));
}

#[test]
fn extreme_nth_arguments_do_not_overflow() {
    let tree = sample_tree();
    assert!(!matches(&tree, 3, "a:nth-child(-2147483647)"));
    assert!(!matches(&tree, 3, "a:nth-child(-2147483648)"));
    assert!(!matches(&tree, 4, "a:nth-last-child(2147483647n-2147483648)"));
    assert!(matches(&tree, 3, "a:nth-child(-2147483648n+1)"));
    assert!(!matches(&tree, 4, "a:nth-child(-2147483648n+1)"));
    assert!(matches(&tree, 5, "a:nth-of-type(2147483647n+3)"));
}
