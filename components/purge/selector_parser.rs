/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The selector parser.
//!
//! Selectors are parsed into flat component sequences, with combinators
//! recorded in-line between compound selectors. The usage matcher only ever
//! asks whether each atomic component is individually satisfiable, so no
//! specificity or tree-matching data is kept.

use std::fmt::{self, Write};

use cssparser::{Parser, ParseError, Token};
use smallvec::SmallVec;

use crate::error_reporting::StyleParseErrorKind;

/// How two compound selectors in a complex selector relate to each other.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Combinator {
    /// `a b`
    Descendant,
    /// `a > b`
    Child,
    /// `a + b`
    NextSibling,
    /// `a ~ b`
    LaterSibling,
}

/// The operator of an attribute selector with a value, `[attr <op> value]`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttrSelectorOperator {
    /// `=`
    Equal,
    /// `~=`
    Includes,
    /// `|=`
    DashMatch,
    /// `^=`
    Prefix,
    /// `*=`
    Substring,
    /// `$=`
    Suffix,
}

impl AttrSelectorOperator {
    /// Evaluates the operator against one attribute value observed in markup.
    pub fn eval_str(self, element_value: &str, selector_value: &str) -> bool {
        let e = element_value.as_bytes();
        let s = selector_value.as_bytes();
        match self {
            AttrSelectorOperator::Equal => e == s,
            AttrSelectorOperator::Includes => {
                !selector_value.is_empty() &&
                    element_value
                        .split_ascii_whitespace()
                        .any(|part| part.as_bytes() == s)
            },
            AttrSelectorOperator::DashMatch => {
                e == s || (e.len() > s.len() && e.starts_with(s) && e[s.len()] == b'-')
            },
            AttrSelectorOperator::Prefix => {
                !selector_value.is_empty() && e.starts_with(s)
            },
            AttrSelectorOperator::Substring => {
                !selector_value.is_empty() && element_value.contains(selector_value)
            },
            AttrSelectorOperator::Suffix => {
                !selector_value.is_empty() && e.ends_with(s)
            },
        }
    }
}

/// One simple selector, or a combinator between two compound selectors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Component {
    /// A combinator between the preceding and following compounds.
    Combinator(Combinator),
    /// `div`
    LocalName(String),
    /// `*`
    ExplicitUniversalType,
    /// `#id`
    ID(String),
    /// `.class`
    Class(String),
    /// `[attr]`
    AttributeExists(String),
    /// `[attr <op> value]`, with an optional `i`/`s` case flag.
    AttributeInNoNamespace {
        /// The attribute name.
        local_name: String,
        /// The comparison operator.
        operator: AttrSelectorOperator,
        /// The expected value.
        value: String,
        /// Whether the `i` flag requested case-insensitive comparison.
        case_insensitive: bool,
    },
    /// `:hover`, `:not(...)`, `:nth-child(...)`. Arguments of functional
    /// pseudo-classes are consumed and discarded; pseudo-classes are
    /// structural or state markers and never affect pruning.
    NonTSPseudoClass(String),
    /// `::before` and friends.
    PseudoElement(String),
}

/// One selector of a comma-separated selector list.
///
/// `text` is the trimmed verbatim source of the selector, used for serialization
/// and for forced-keep comparisons.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Selector {
    pub components: Vec<Component>,
    pub text: String,
}

/// A comma-separated list of selectors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelectorList(pub SmallVec<[Selector; 1]>);

impl SelectorList {
    /// Parse a comma-separated list of Selectors.
    /// <https://drafts.csswg.org/selectors/#grouping>
    pub fn parse<'i, 't>(
        input: &mut Parser<'i, 't>,
    ) -> Result<Self, ParseError<'i, StyleParseErrorKind>> {
        input
            .parse_comma_separated(|input| Selector::parse(input))
            .map(|selectors| SelectorList(SmallVec::from_vec(selectors)))
    }

    pub fn to_css<W: Write>(&self, dest: &mut W) -> fmt::Result {
        let mut iter = self.0.iter();
        match iter.next() {
            None => return Ok(()),
            Some(first) => dest.write_str(&first.text)?,
        }
        for selector in iter {
            dest.write_str(", ")?;
            dest.write_str(&selector.text)?;
        }
        Ok(())
    }

    pub fn to_css_string(&self) -> String {
        let mut result = String::new();
        self.to_css(&mut result).unwrap();
        result
    }
}

impl Selector {
    /// Parse one selector, up to the next top-level comma or the end of the
    /// input.
    pub fn parse<'i, 't>(
        input: &mut Parser<'i, 't>,
    ) -> Result<Self, ParseError<'i, StyleParseErrorKind>> {
        input.skip_whitespace();
        let start = input.position();
        let components = parse_complex_selector(input)?;
        let text = input.slice_from(start).trim().to_owned();
        Ok(Selector { components, text })
    }
}

fn parse_complex_selector<'i, 't>(
    input: &mut Parser<'i, 't>,
) -> Result<Vec<Component>, ParseError<'i, StyleParseErrorKind>> {
    let mut components = Vec::new();
    'outer_loop: loop {
        parse_compound_selector(input, &mut components)?;

        // Parse a combinator.
        let combinator;
        let mut any_whitespace = false;
        loop {
            let before_combinator = input.state();
            match input.next_including_whitespace() {
                Err(_) => break 'outer_loop,
                Ok(&Token::WhiteSpace(_)) => any_whitespace = true,
                Ok(&Token::Delim('>')) => {
                    combinator = Combinator::Child;
                    break;
                },
                Ok(&Token::Delim('+')) => {
                    combinator = Combinator::NextSibling;
                    break;
                },
                Ok(&Token::Delim('~')) => {
                    combinator = Combinator::LaterSibling;
                    break;
                },
                Ok(_) => {
                    input.reset(&before_combinator);
                    if any_whitespace {
                        combinator = Combinator::Descendant;
                        break;
                    }
                    break 'outer_loop;
                },
            }
        }
        components.push(Component::Combinator(combinator));
    }
    Ok(components)
}

/// Parse a sequence of simple selectors with no combinators in between.
fn parse_compound_selector<'i, 't>(
    input: &mut Parser<'i, 't>,
    components: &mut Vec<Component>,
) -> Result<(), ParseError<'i, StyleParseErrorKind>> {
    input.skip_whitespace();
    let mut empty = true;
    if parse_type_selector(input, components)? {
        empty = false;
    }
    while let Some(component) = parse_one_simple_selector(input)? {
        components.push(component);
        empty = false;
    }
    if empty {
        // An empty selector is invalid.
        return Err(input.new_custom_error(StyleParseErrorKind::EmptySelector));
    }
    Ok(())
}

fn parse_type_selector<'i, 't>(
    input: &mut Parser<'i, 't>,
    components: &mut Vec<Component>,
) -> Result<bool, ParseError<'i, StyleParseErrorKind>> {
    let start = input.state();
    match input.next_including_whitespace() {
        Ok(&Token::Ident(ref name)) => {
            let name = name.as_ref().to_owned();
            components.push(Component::LocalName(name));
            Ok(true)
        },
        Ok(&Token::Delim('*')) => {
            components.push(Component::ExplicitUniversalType);
            Ok(true)
        },
        _ => {
            input.reset(&start);
            Ok(false)
        },
    }
}

/// Parse one simple selector other than a type selector.
fn parse_one_simple_selector<'i, 't>(
    input: &mut Parser<'i, 't>,
) -> Result<Option<Component>, ParseError<'i, StyleParseErrorKind>> {
    let start = input.state();
    let token = match input.next_including_whitespace() {
        Ok(t) => t.clone(),
        Err(_) => return Ok(None),
    };
    match token {
        Token::IDHash(id) => Ok(Some(Component::ID(id.as_ref().to_owned()))),
        Token::Delim('.') => {
            let location = input.current_source_location();
            match input.next_including_whitespace()?.clone() {
                Token::Ident(class) => Ok(Some(Component::Class(class.as_ref().to_owned()))),
                t => Err(location.new_unexpected_token_error(t)),
            }
        },
        Token::SquareBracketBlock => {
            let attr = input.parse_nested_block(|input| parse_attribute_selector(input))?;
            Ok(Some(attr))
        },
        Token::Colon => {
            let location = input.current_source_location();
            match input.next_including_whitespace()?.clone() {
                Token::Ident(name) => {
                    // The CSS 2.1 pseudo-elements are also valid with a
                    // single colon.
                    let component = if is_css2_pseudo_element(&name) {
                        Component::PseudoElement(name.as_ref().to_owned())
                    } else {
                        Component::NonTSPseudoClass(name.as_ref().to_owned())
                    };
                    Ok(Some(component))
                },
                Token::Function(name) => {
                    // `:not(...)`, `:is(...)`, `:nth-child(...)`: the
                    // argument never contributes usage requirements, but its
                    // commas must not split the enclosing selector list, so
                    // consume it as a nested block.
                    input.parse_nested_block(|input| consume_remnants(input))?;
                    Ok(Some(Component::NonTSPseudoClass(name.as_ref().to_owned())))
                },
                Token::Colon => match input.next_including_whitespace()?.clone() {
                    Token::Ident(name) => {
                        Ok(Some(Component::PseudoElement(name.as_ref().to_owned())))
                    },
                    Token::Function(name) => {
                        input.parse_nested_block(|input| consume_remnants(input))?;
                        Ok(Some(Component::PseudoElement(name.as_ref().to_owned())))
                    },
                    t => Err(location.new_unexpected_token_error(t)),
                },
                t => Err(location.new_unexpected_token_error(t)),
            }
        },
        _ => {
            input.reset(&start);
            Ok(None)
        },
    }
}

fn is_css2_pseudo_element(name: &str) -> bool {
    name.eq_ignore_ascii_case("before") ||
        name.eq_ignore_ascii_case("after") ||
        name.eq_ignore_ascii_case("first-line") ||
        name.eq_ignore_ascii_case("first-letter")
}

fn consume_remnants<'i, 't>(
    input: &mut Parser<'i, 't>,
) -> Result<(), ParseError<'i, StyleParseErrorKind>> {
    while input.next_including_whitespace().is_ok() {}
    Ok(())
}

fn parse_attribute_selector<'i, 't>(
    input: &mut Parser<'i, 't>,
) -> Result<Component, ParseError<'i, StyleParseErrorKind>> {
    let local_name = input.expect_ident()?.as_ref().to_owned();

    let token = match input.next() {
        // [foo]
        Err(_) => return Ok(Component::AttributeExists(local_name)),
        Ok(t) => t.clone(),
    };
    let operator = match token {
        // [foo=bar]
        Token::Delim('=') => AttrSelectorOperator::Equal,
        // [foo~=bar]
        Token::IncludeMatch => AttrSelectorOperator::Includes,
        // [foo|=bar]
        Token::DashMatch => AttrSelectorOperator::DashMatch,
        // [foo^=bar]
        Token::PrefixMatch => AttrSelectorOperator::Prefix,
        // [foo*=bar]
        Token::SubstringMatch => AttrSelectorOperator::Substring,
        // [foo$=bar]
        Token::SuffixMatch => AttrSelectorOperator::Suffix,
        t => return Err(input.new_unexpected_token_error(t)),
    };
    let value = input.expect_ident_or_string()?.as_ref().to_owned();
    let case_insensitive = parse_attribute_flags(input)?;
    Ok(Component::AttributeInNoNamespace {
        local_name,
        operator,
        value,
        case_insensitive,
    })
}

fn parse_attribute_flags<'i, 't>(
    input: &mut Parser<'i, 't>,
) -> Result<bool, ParseError<'i, StyleParseErrorKind>> {
    let token = match input.next() {
        Err(_) => return Ok(false),
        Ok(t) => t.clone(),
    };
    match token {
        Token::Ident(ref value) if value.eq_ignore_ascii_case("i") => Ok(true),
        Token::Ident(ref value) if value.eq_ignore_ascii_case("s") => Ok(false),
        t => Err(input.new_unexpected_token_error(t)),
    }
}
