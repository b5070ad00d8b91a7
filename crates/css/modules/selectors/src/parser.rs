//! CSS selector parsing.
//! Spec: <https://www.w3.org/TR/selectors-4/>

use crate::{
    AttrOperator, Combinator, ComplexSelector, CompoundSelector, Nth, PseudoClass, SelectorList,
    SimpleSelector,
};
use anyhow::{Result, anyhow, bail};
use core::mem::take;

/// Pseudo-elements that CSS2 allowed with a single colon.
const LEGACY_PSEUDO_ELEMENTS: &[&str] = &["before", "after", "first-line", "first-letter"];

/// Pseudo-classes that depend on user interaction or navigation state.
const USER_ACTION_PSEUDO_CLASSES: &[&str] = &[
    "hover",
    "active",
    "focus",
    "focus-within",
    "focus-visible",
    "visited",
    "target",
];

#[derive(Clone, Debug, PartialEq, Eq)]
/// Internal tokenizer token kinds.
pub enum Tok {
    /// A combinator token like child/adjacent/general sibling.
    Combinator(Combinator),
    /// Whitespace that implies a descendant combinator.
    DescendantWS,
    /// A simple selector token.
    Simple(SimpleSelector),
}

/// Tokenizer over a selector string.
pub struct SelectorTokenizer<'input> {
    /// Underlying bytes for the selector.
    input_bytes: &'input [u8],
    /// Current cursor index into `input_bytes`.
    index: usize,
}

impl<'input> SelectorTokenizer<'input> {
    #[inline]
    pub(crate) const fn new(input: &'input str) -> Self {
        Self {
            input_bytes: input.as_bytes(),
            index: 0,
        }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.input_bytes.get(self.index).copied()
    }

    #[inline]
    fn bump(&mut self) {
        self.index = self.index.saturating_add(1);
    }

    /// Return the next selector token, if any.
    ///
    /// # Errors
    /// Returns an error on characters that cannot start a selector token or
    /// on malformed attribute and pseudo-class syntax.
    pub(crate) fn next_token(&mut self) -> Result<Option<Tok>> {
        let start = self.index;
        self.skip_spaces();
        let Some(current) = self.peek() else {
            return Ok(None);
        };
        if self.index > start && start > 0 {
            return Ok(Some(Tok::DescendantWS));
        }
        let token = match current {
            b'*' => {
                self.bump();
                Tok::Simple(SimpleSelector::Universal)
            }
            b'.' => {
                self.bump();
                Tok::Simple(SimpleSelector::Class(self.consume_required_ident("class")?))
            }
            b'#' => {
                self.bump();
                Tok::Simple(SimpleSelector::IdSelector(
                    self.consume_required_ident("id")?,
                ))
            }
            b'[' => self.consume_attr()?,
            b':' => self.consume_pseudo()?,
            b'>' => {
                self.bump();
                Tok::Combinator(Combinator::Child)
            }
            b'+' => {
                self.bump();
                Tok::Combinator(Combinator::AdjacentSibling)
            }
            b'~' => {
                self.bump();
                Tok::Combinator(Combinator::GeneralSibling)
            }
            byte if is_ident_byte(byte) => {
                let ident = self.consume_ident();
                Tok::Simple(SimpleSelector::Type(ident.to_ascii_lowercase()))
            }
            other => bail!("unexpected character {:?} in selector", char::from(other)),
        };
        Ok(Some(token))
    }

    /// Consume an identifier: ASCII alphanumerics, '-', '_', non-ASCII bytes
    /// and backslash escapes. Case is preserved.
    fn consume_ident(&mut self) -> String {
        let mut bytes = Vec::new();
        while let Some(byte) = self.peek() {
            if byte == b'\\' {
                self.bump();
                if let Some(escaped) = self.peek() {
                    bytes.push(escaped);
                    self.bump();
                }
            } else if is_ident_byte(byte) {
                bytes.push(byte);
                self.bump();
            } else {
                break;
            }
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }

    fn consume_required_ident(&mut self, what: &str) -> Result<String> {
        let ident = self.consume_ident();
        if ident.is_empty() {
            bail!("expected {what} name at offset {}", self.index);
        }
        Ok(ident)
    }

    /// Parse an attribute selector: `[name]` or `[name op value]`, with an
    /// optional trailing `i`/`s` flag that is accepted and ignored.
    fn consume_attr(&mut self) -> Result<Tok> {
        // skip '['
        self.bump();
        self.skip_spaces();
        let name = self.consume_required_ident("attribute")?.to_ascii_lowercase();
        self.skip_spaces();
        let operator = if self.peek() == Some(b']') {
            AttrOperator::Exists
        } else {
            let kind = self.consume_attr_operator()?;
            self.skip_spaces();
            let value = match self.peek() {
                Some(quote @ (b'"' | b'\'')) => {
                    self.bump();
                    self.consume_quoted_value(quote)?
                }
                _ => self.consume_required_ident("attribute value")?,
            };
            self.skip_spaces();
            if matches!(self.peek(), Some(b'i' | b'I' | b's' | b'S')) {
                self.bump();
                self.skip_spaces();
            }
            kind(value)
        };
        if self.peek() != Some(b']') {
            bail!("unterminated attribute selector for {name:?}");
        }
        self.bump();
        Ok(Tok::Simple(SimpleSelector::Attribute { name, operator }))
    }

    fn consume_attr_operator(&mut self) -> Result<fn(String) -> AttrOperator> {
        let Some(first) = self.peek() else {
            bail!("unterminated attribute selector");
        };
        if first == b'=' {
            self.bump();
            return Ok(AttrOperator::Equals);
        }
        let kind: fn(String) -> AttrOperator = match first {
            b'~' => AttrOperator::Includes,
            b'|' => AttrOperator::DashMatch,
            b'^' => AttrOperator::Prefix,
            b'$' => AttrOperator::Suffix,
            b'*' => AttrOperator::Substring,
            other => bail!(
                "unexpected character {:?} in attribute selector",
                char::from(other)
            ),
        };
        self.bump();
        if self.peek() != Some(b'=') {
            bail!("expected '=' after attribute operator");
        }
        self.bump();
        Ok(kind)
    }

    fn consume_quoted_value(&mut self, quote: u8) -> Result<String> {
        let mut bytes = Vec::new();
        loop {
            match self.peek() {
                None => bail!("unterminated string in attribute selector"),
                Some(byte) if byte == quote => {
                    self.bump();
                    break;
                }
                Some(b'\\') => {
                    self.bump();
                    if let Some(escaped) = self.peek() {
                        bytes.push(escaped);
                        self.bump();
                    }
                }
                Some(byte) => {
                    bytes.push(byte);
                    self.bump();
                }
            }
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Parse `:name`, `:name(args)` or `::name`.
    fn consume_pseudo(&mut self) -> Result<Tok> {
        // skip ':'
        self.bump();
        if self.peek() == Some(b':') {
            self.bump();
            let name = self.consume_required_ident("pseudo-element")?;
            return Ok(Tok::Simple(SimpleSelector::PseudoElement(
                name.to_ascii_lowercase(),
            )));
        }
        let name = self
            .consume_required_ident("pseudo-class")?
            .to_ascii_lowercase();
        if self.peek() == Some(b'(') {
            self.bump();
            let argument = self.consume_parenthesized()?;
            return Ok(Tok::Simple(SimpleSelector::PseudoClass(
                functional_pseudo_class(&name, argument.trim())?,
            )));
        }
        if LEGACY_PSEUDO_ELEMENTS.contains(&name.as_str()) {
            return Ok(Tok::Simple(SimpleSelector::PseudoElement(name)));
        }
        Ok(Tok::Simple(SimpleSelector::PseudoClass(plain_pseudo_class(
            name,
        )?)))
    }

    /// Consume up to the `)` that balances an already consumed `(`.
    fn consume_parenthesized(&mut self) -> Result<String> {
        let start = self.index;
        let mut depth = 1usize;
        let mut quote: Option<u8> = None;
        while let Some(byte) = self.peek() {
            self.bump();
            match (quote, byte) {
                (Some(open), _) if byte == open => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(byte),
                (None, b'(') => depth += 1,
                (None, b')') => {
                    depth -= 1;
                    if depth == 0 {
                        let inner = self
                            .input_bytes
                            .get(start..self.index.saturating_sub(1))
                            .unwrap_or(&[]);
                        return Ok(String::from_utf8_lossy(inner).into_owned());
                    }
                }
                (None, _) => {}
            }
        }
        Err(anyhow!("unbalanced parentheses in selector"))
    }

    /// Skip ASCII whitespace.
    #[inline]
    fn skip_spaces(&mut self) {
        while self.peek().is_some_and(|byte| byte.is_ascii_whitespace()) {
            self.bump();
        }
    }
}

#[inline]
const fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' || byte >= 0x80 || byte == b'\\'
}

fn plain_pseudo_class(name: String) -> Result<PseudoClass> {
    let pseudo = match name.as_str() {
        "first-child" => PseudoClass::FirstChild,
        "last-child" => PseudoClass::LastChild,
        "only-child" => PseudoClass::OnlyChild,
        "first-of-type" => PseudoClass::NthOfType(Nth { step: 0, offset: 1 }),
        "last-of-type" => PseudoClass::NthLastOfType(Nth { step: 0, offset: 1 }),
        "only-of-type" => PseudoClass::OnlyOfType,
        "empty" => PseudoClass::Empty,
        "root" => PseudoClass::Root,
        "checked" => PseudoClass::Checked,
        "disabled" => PseudoClass::Disabled,
        "enabled" => PseudoClass::Enabled,
        "link" | "any-link" => PseudoClass::AnyLink,
        other if USER_ACTION_PSEUDO_CLASSES.contains(&other) => PseudoClass::UserAction(name),
        other => bail!("unsupported pseudo-class :{other}"),
    };
    Ok(pseudo)
}

fn functional_pseudo_class(name: &str, argument: &str) -> Result<PseudoClass> {
    let pseudo = match name {
        "nth-child" => PseudoClass::NthChild(parse_nth(argument)?),
        "nth-last-child" => PseudoClass::NthLastChild(parse_nth(argument)?),
        "nth-of-type" => PseudoClass::NthOfType(parse_nth(argument)?),
        "nth-last-of-type" => PseudoClass::NthLastOfType(parse_nth(argument)?),
        "not" => {
            let mut compounds = Vec::new();
            for part in split_selector_list(argument) {
                let complex = parse_complex_selector(part)?;
                if !complex.rest.is_empty() {
                    bail!(":not() only accepts compound selectors here");
                }
                compounds.push(complex.first);
            }
            if compounds.is_empty() {
                bail!(":not() requires an argument");
            }
            PseudoClass::Not(compounds)
        }
        other => bail!("unsupported functional pseudo-class :{other}()"),
    };
    Ok(pseudo)
}

/// Parse an `an+b` expression, including the `odd` and `even` keywords.
fn parse_nth(argument: &str) -> Result<Nth> {
    let compact: String = argument
        .chars()
        .filter(|character| !character.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    match compact.as_str() {
        "odd" => return Ok(Nth { step: 2, offset: 1 }),
        "even" => return Ok(Nth { step: 2, offset: 0 }),
        "" => bail!("empty nth expression"),
        _ => {}
    }
    let Some((step_text, offset_text)) = compact.split_once('n') else {
        let offset = compact
            .parse::<i32>()
            .map_err(|err| anyhow!("invalid nth expression {argument:?}: {err}"))?;
        return Ok(Nth { step: 0, offset });
    };
    let step = match step_text {
        "" | "+" => 1,
        "-" => -1,
        text => text
            .parse::<i32>()
            .map_err(|err| anyhow!("invalid nth step {argument:?}: {err}"))?,
    };
    let offset = if offset_text.is_empty() {
        0
    } else {
        offset_text
            .parse::<i32>()
            .map_err(|err| anyhow!("invalid nth offset {argument:?}: {err}"))?
    };
    Ok(Nth { step, offset })
}

/// Split selector text on top-level commas, ignoring commas nested in
/// parentheses, brackets or quotes. Parts are trimmed; empty parts are kept
/// so callers can reject them.
pub fn split_selector_list(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0usize;
    for (offset, character) in input.char_indices() {
        match (quote, character) {
            (Some(open), _) if character == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(character),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(input.get(start..offset).unwrap_or_default().trim());
                start = offset + 1;
            }
            (None, _) => {}
        }
    }
    parts.push(input.get(start..).unwrap_or_default().trim());
    parts
}

/// Parse a selector list from CSS text.
/// Spec: Section 4 — an invalid member invalidates the whole list.
///
/// # Errors
/// Returns an error if any comma-separated member fails to parse.
pub fn parse_selector_list(input: &str) -> Result<SelectorList> {
    let mut list = SelectorList::default();
    for part in split_selector_list(input) {
        list.selectors.push(parse_complex_selector(part)?);
    }
    Ok(list)
}

/// Parse one complex selector.
/// Spec: Section 11 — Combinators; Section 5–8 — simple selectors
///
/// # Errors
/// Returns an error for empty input, dangling or doubled combinators,
/// unsupported pseudo-classes and malformed tokens.
pub fn parse_complex_selector(input: &str) -> Result<ComplexSelector> {
    let mut tokens = SelectorTokenizer::new(input.trim());
    let mut current = CompoundSelector::default();
    let mut first: Option<CompoundSelector> = None;
    let mut rest: Vec<(Combinator, CompoundSelector)> = Vec::new();
    // Combinator joining `current` to the compound before it.
    let mut link: Option<Combinator> = None;
    // Combinator seen after `current`, applied once the next compound starts.
    let mut pending: Option<Combinator> = None;

    while let Some(token) = tokens.next_token()? {
        match token {
            Tok::DescendantWS => {
                if !current.simples.is_empty() && pending.is_none() {
                    pending = Some(Combinator::Descendant);
                }
            }
            Tok::Combinator(comb) => {
                if current.simples.is_empty() {
                    bail!("selector {input:?} has a combinator without a left-hand side");
                }
                match pending {
                    None | Some(Combinator::Descendant) => pending = Some(comb),
                    Some(_) => bail!("selector {input:?} has consecutive combinators"),
                }
            }
            Tok::Simple(simple) => {
                if let Some(comb) = pending.take() {
                    push_compound(&mut first, &mut rest, link, take(&mut current));
                    link = Some(comb);
                }
                current.simples.push(simple);
            }
        }
    }

    if current.simples.is_empty() {
        bail!("empty selector");
    }
    if matches!(pending, Some(comb) if comb != Combinator::Descendant) {
        bail!("selector {input:?} ends with a combinator");
    }
    push_compound(&mut first, &mut rest, link, current);

    Ok(ComplexSelector {
        first: first.unwrap_or_default(),
        rest,
    })
}

fn push_compound(
    first: &mut Option<CompoundSelector>,
    rest: &mut Vec<(Combinator, CompoundSelector)>,
    link: Option<Combinator>,
    compound: CompoundSelector,
) {
    if first.is_none() {
        *first = Some(compound);
    } else {
        rest.push((link.unwrap_or(Combinator::Descendant), compound));
    }
}
