//! CSS Syntax Module Level 3 — Parsing and tokenization.
//! Spec: <https://www.w3.org/TR/css-syntax-3/>
//!
//! Produces a flat rule list: style rules (optionally scoped by the
//! conditional group rule that wraps them) and opaque at-rules kept as text.
use anyhow::{Result, bail};
use cssparser::AtRuleParser as CssAtRuleParser;
use cssparser::BasicParseErrorKind;
use cssparser::CowRcStr;
use cssparser::DeclarationParser as CssDeclarationParser;
use cssparser::ParseError;
use cssparser::Parser;
use cssparser::ParserInput;
use cssparser::ParserState;
use cssparser::QualifiedRuleParser as CssQualifiedRuleParser;
use cssparser::RuleBodyItemParser as CssRuleBodyItemParser;
use cssparser::RuleBodyParser as CssRuleBodyParser;
use cssparser::StyleSheetParser;

/// Conditional group rules whose nested style rules are flattened.
/// Spec: <https://www.w3.org/TR/css-conditional-3/>
pub const CONDITIONAL_AT_RULES: &[&str] = &["media", "supports", "container"];

/// A single CSS declaration (property: value [!important]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// Lowercased property name (custom properties keep their case).
    pub name: String,
    /// Value text with whitespace collapsed, without trailing !important.
    pub value: String,
    /// Whether the declaration was marked as `!important`.
    pub important: bool,
}

/// A single style rule with a raw prelude and parsed declarations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleRule {
    /// Prelude text (the selector list), whitespace collapsed.
    pub prelude: String,
    /// Declarations within the rule block.
    pub declarations: Vec<Declaration>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleKind {
    Style(StyleRule),
    /// An at-rule kept verbatim, e.g. `@keyframes` or `@font-face`.
    Opaque(String),
}

/// One entry of the flattened rule list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    pub kind: RuleKind,
    /// Wrapping conditional group, as `@<keyword> <condition>`.
    pub condition: Option<String>,
}

/// A parsed stylesheet in source order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
}

/// Collapse runs of whitespace to a single space outside of quoted strings
/// and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    let mut pending_space = false;
    for character in text.trim().chars() {
        match quote {
            Some(open) => {
                if character == open {
                    quote = None;
                }
                out.push(character);
            }
            None if character.is_whitespace() => pending_space = true,
            None => {
                if pending_space {
                    out.push(' ');
                    pending_space = false;
                }
                if matches!(character, '"' | '\'') {
                    quote = Some(character);
                }
                out.push(character);
            }
        }
    }
    out
}

/// Parse `!important` at the end of a value, returning (`value_without_important`, `important_flag`).
fn split_important_tail(value: &str) -> (String, bool) {
    let trimmed = value.trim();
    let marker = "!important";
    if trimmed.len() >= marker.len()
        && let Some(tail) = trimmed.get(trimmed.len() - marker.len()..)
        && tail.eq_ignore_ascii_case(marker)
        && let Some(prefix) = trimmed.get(..trimmed.len() - marker.len())
    {
        return (collapse_whitespace(prefix), true);
    }
    (collapse_whitespace(trimmed), false)
}

/// A declaration parser that records property name and its raw value.
struct BodyDeclParser;

impl<'i> CssDeclarationParser<'i> for BodyDeclParser {
    type Declaration = Declaration;
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _decl_start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let start = input.position();
        // Consume until end of the declaration item.
        while input.next_including_whitespace_and_comments().is_ok() {}
        let raw = input.slice_from(start);
        let (value, important) = split_important_tail(raw);
        if value.is_empty() {
            return Err(input.new_error(BasicParseErrorKind::EndOfInput));
        }
        let name = if name.starts_with("--") {
            name.to_string()
        } else {
            name.to_ascii_lowercase()
        };
        Ok(Declaration {
            name,
            value,
            important,
        })
    }
}

impl<'i> CssAtRuleParser<'i> for BodyDeclParser {
    type Prelude = ();
    type AtRule = Declaration; // Not produced
    type Error = ();

    #[inline]
    fn parse_prelude<'t>(
        &mut self,
        _name: CowRcStr<'i>,
        _input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Ok(())
    }

    #[inline]
    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _state: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        // Not produced by this parser
        Err(input.new_error(BasicParseErrorKind::AtRuleBodyInvalid))
    }

    #[inline]
    fn rule_without_block(
        &mut self,
        _prelude: Self::Prelude,
        _state: &ParserState,
    ) -> Result<Self::AtRule, Self::Error> {
        Err(())
    }
}

impl<'i> CssQualifiedRuleParser<'i> for BodyDeclParser {
    type Prelude = ();
    type QualifiedRule = Declaration; // Not produced
    type Error = ();

    #[inline]
    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_error(BasicParseErrorKind::QualifiedRuleInvalid))
    }

    #[inline]
    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _state: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        Err(input.new_error(BasicParseErrorKind::QualifiedRuleInvalid))
    }
}

impl CssRuleBodyItemParser<'_, Declaration, ()> for BodyDeclParser {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

/// Prelude of an at-rule, classified by name.
enum AtPrelude {
    /// `@media`/`@supports`/`@container` at top level.
    Conditional { keyword: String, condition: String },
    /// Anything else, including conditional groups nested in another group.
    Opaque { name: String, prelude: String },
}

/// Rule-list parser for the top level and for the body of a conditional
/// group. Inside a group, `condition` carries the group's header.
#[derive(Default)]
struct TopLevelParser {
    condition: Option<String>,
}

impl TopLevelParser {
    fn single(&self, kind: RuleKind) -> Vec<Rule> {
        vec![Rule {
            kind,
            condition: self.condition.clone(),
        }]
    }
}

impl<'i> CssAtRuleParser<'i> for TopLevelParser {
    type Prelude = AtPrelude;
    type AtRule = Vec<Rule>;
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let start = input.position();
        while input.next_including_whitespace_and_comments().is_ok() {}
        let prelude = collapse_whitespace(input.slice_from(start));
        let keyword = name.to_ascii_lowercase();
        if self.condition.is_none() && CONDITIONAL_AT_RULES.contains(&keyword.as_str()) {
            return Ok(AtPrelude::Conditional {
                keyword,
                condition: prelude,
            });
        }
        Ok(AtPrelude::Opaque {
            name: name.to_string(),
            prelude,
        })
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        match prelude {
            AtPrelude::Conditional { keyword, condition } => {
                let header = if condition.is_empty() {
                    format!("@{keyword}")
                } else {
                    format!("@{keyword} {condition}")
                };
                let mut nested = Self {
                    condition: Some(header),
                };
                let mut rules = Vec::new();
                for item in StyleSheetParser::new(input, &mut nested) {
                    match item {
                        Ok(mut batch) => rules.append(&mut batch),
                        Err((err, _)) => return Err(err),
                    }
                }
                Ok(rules)
            }
            AtPrelude::Opaque { .. } => {
                // Skip the block; the slice then spans from '@' to just
                // before the closing brace.
                while input.next_including_whitespace_and_comments().is_ok() {}
                let text = input.slice_from(start.position()).trim_end();
                Ok(self.single(RuleKind::Opaque(format!("{text}\n}}"))))
            }
        }
    }

    fn rule_without_block(
        &mut self,
        prelude: Self::Prelude,
        _state: &ParserState,
    ) -> Result<Self::AtRule, Self::Error> {
        match prelude {
            AtPrelude::Conditional { .. } => Err(()),
            AtPrelude::Opaque { name, prelude } => {
                let text = if prelude.is_empty() {
                    format!("@{name};")
                } else {
                    format!("@{name} {prelude};")
                };
                Ok(self.single(RuleKind::Opaque(text)))
            }
        }
    }
}

impl<'i> CssQualifiedRuleParser<'i> for TopLevelParser {
    type Prelude = String; // raw selector/prelude
    type QualifiedRule = Vec<Rule>;
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let start = input.state();
        while input.next_including_whitespace_and_comments().is_ok() {}
        let prelude = collapse_whitespace(input.slice_from(start.position()));
        if prelude.is_empty() {
            return Err(input.new_error(BasicParseErrorKind::QualifiedRuleInvalid));
        }
        Ok(prelude)
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _state: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        let declarations = parse_declarations_from_block(input);
        Ok(self.single(RuleKind::Style(StyleRule {
            prelude,
            declarations,
        })))
    }
}

/// Parse declarations from a rule block using `cssparser` body parser.
/// Invalid declarations are dropped, as a browser would.
fn parse_declarations_from_block(block: &mut Parser) -> Vec<Declaration> {
    let mut out: Vec<Declaration> = Vec::new();
    let mut body = BodyDeclParser;
    for decl in CssRuleBodyParser::new(block, &mut body) {
        match decl {
            Ok(declaration) => out.push(declaration),
            Err((_, slice)) => log::trace!("dropping invalid declaration {:?}", slice.trim()),
        }
    }
    out
}

/// Parse a full stylesheet into a `Stylesheet` using cssparser.
///
/// # Errors
/// Returns an error describing the first rule that could not be parsed.
/// Invalid declarations inside an otherwise valid rule are not errors.
pub fn parse_stylesheet(css: &str) -> Result<Stylesheet> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut top = TopLevelParser::default();
    let mut sheet = Stylesheet::default();
    for item in StyleSheetParser::new(&mut parser, &mut top) {
        match item {
            Ok(mut rules) => sheet.rules.append(&mut rules),
            Err((err, slice)) => bail!(
                "invalid rule at line {}, column {}: {:?}",
                err.location.line + 1,
                err.location.column,
                slice.trim()
            ),
        }
    }
    Ok(sheet)
}
