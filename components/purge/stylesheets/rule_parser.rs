/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Parsing of the stylesheet contents.

use cssparser::{
    AtRuleParser, CowRcStr, ParseError, Parser, ParserState, QualifiedRuleParser,
    StyleSheetParser, Token,
};

use crate::error_reporting::StyleParseErrorKind;
use crate::selector_parser::SelectorList;
use crate::stylesheets::{
    BlockRule, ConditionalRule, CssRule, KeyframesRule, StatementRule, StyleRule, Stylesheet,
};

/// The parser for rules at the top level of a stylesheet, and (it carries no
/// top-level-only state) for the rule lists nested inside conditional group
/// rules.
pub struct TopLevelRuleParser<'i> {
    /// The whole stylesheet source, for verbatim block slicing and for
    /// telling an EOF-terminated block from a properly closed one.
    source: &'i str,
}

/// The prelude of an at-rule, classified by what its block must contain.
pub enum AtRulePrelude {
    /// A conditional group rule: the block is a nested rule list.
    Conditional(String, String),
    /// `@keyframes <name>`, with the at-keyword as written.
    Keyframes(String, String),
    /// Everything else: the block (if any) is opaque.
    Other(String, String),
}

impl<'i> TopLevelRuleParser<'i> {
    pub fn new(source: &'i str) -> Self {
        TopLevelRuleParser { source }
    }

    fn parse_rule_list<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Stylesheet, ParseError<'i, StyleParseErrorKind>> {
        let mut nested = TopLevelRuleParser::new(self.source);
        let mut rules = Vec::new();
        let mut iter = StyleSheetParser::new(input, &mut nested);
        while let Some(result) = iter.next() {
            match result {
                Ok(rule) => rules.push(rule),
                // No recovery: a rule we cannot parse poisons the whole
                // stylesheet (see Stylesheet::from_str).
                Err((error, _)) => return Err(error),
            }
        }
        Ok(Stylesheet { rules })
    }

    /// Consume the rest of `input` and return it verbatim, rejecting bad
    /// string and url tokens on the way.
    fn consume_verbatim<'t>(
        &self,
        input: &mut Parser<'i, 't>,
    ) -> Result<&'i str, ParseError<'i, StyleParseErrorKind>> {
        let start = input.position();
        loop {
            let token = match input.next() {
                Ok(token) => token.clone(),
                Err(_) => break,
            };
            match token {
                Token::BadString(_) => {
                    return Err(input.new_custom_error(StyleParseErrorKind::UnterminatedString))
                },
                Token::BadUrl(_) => {
                    return Err(input.new_custom_error(StyleParseErrorKind::BadUrl))
                },
                _ => {},
            }
        }
        Ok(input.slice_from(start))
    }

    /// Like `consume_verbatim` for a `{ }` interior, requiring the closing
    /// brace to actually be there. cssparser follows the CSS syntax spec and
    /// closes still-open blocks at EOF without complaint; for pruning that is
    /// a malformed input we must refuse.
    fn consume_block<'t>(
        &self,
        input: &mut Parser<'i, 't>,
    ) -> Result<String, ParseError<'i, StyleParseErrorKind>> {
        let interior = self.consume_verbatim(input)?;
        if input.position().byte_index() >= self.source.len() {
            return Err(input.new_custom_error(StyleParseErrorKind::UnclosedBlock));
        }
        Ok(interior.to_owned())
    }
}

fn is_conditional_name(name: &str) -> bool {
    name.eq_ignore_ascii_case("media") ||
        name.eq_ignore_ascii_case("supports") ||
        name.eq_ignore_ascii_case("document") ||
        name.eq_ignore_ascii_case("-moz-document") ||
        name.eq_ignore_ascii_case("layer")
}

fn is_keyframes_name(name: &str) -> bool {
    name.eq_ignore_ascii_case("keyframes") ||
        name.eq_ignore_ascii_case("-webkit-keyframes") ||
        name.eq_ignore_ascii_case("-moz-keyframes") ||
        name.eq_ignore_ascii_case("-o-keyframes")
}

impl<'i> QualifiedRuleParser<'i> for TopLevelRuleParser<'i> {
    type Prelude = SelectorList;
    type QualifiedRule = CssRule;
    type Error = StyleParseErrorKind;

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        SelectorList::parse(input)
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        let block = self.consume_block(input)?;
        Ok(CssRule::Style(StyleRule {
            selectors: prelude,
            block,
        }))
    }
}

impl<'i> AtRuleParser<'i> for TopLevelRuleParser<'i> {
    type Prelude = AtRulePrelude;
    type AtRule = CssRule;
    type Error = StyleParseErrorKind;

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        if is_keyframes_name(&name) {
            let keyframes_name = input.expect_ident_or_string()?.as_ref().to_owned();
            input.expect_exhausted()?;
            return Ok(AtRulePrelude::Keyframes(
                name.as_ref().to_owned(),
                keyframes_name,
            ));
        }
        let prelude = self.consume_verbatim(input)?.trim().to_owned();
        if is_conditional_name(&name) {
            Ok(AtRulePrelude::Conditional(name.as_ref().to_owned(), prelude))
        } else {
            Ok(AtRulePrelude::Other(name.as_ref().to_owned(), prelude))
        }
    }

    fn rule_without_block(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
    ) -> Result<Self::AtRule, ()> {
        match prelude {
            // `@keyframes foo;` is not a thing.
            AtRulePrelude::Keyframes(..) => Err(()),
            AtRulePrelude::Conditional(name, prelude) => {
                // Of the conditional group rules only `@layer` has a
                // statement form.
                if name.eq_ignore_ascii_case("layer") {
                    Ok(CssRule::Statement(StatementRule { name, prelude }))
                } else {
                    Err(())
                }
            },
            AtRulePrelude::Other(name, prelude) => {
                Ok(CssRule::Statement(StatementRule { name, prelude }))
            },
        }
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        match prelude {
            AtRulePrelude::Conditional(name, condition) => {
                let stylesheet = self.parse_rule_list(input)?;
                if input.position().byte_index() >= self.source.len() {
                    return Err(input.new_custom_error(StyleParseErrorKind::UnclosedBlock));
                }
                Ok(CssRule::Conditional(ConditionalRule {
                    name,
                    condition,
                    stylesheet,
                }))
            },
            AtRulePrelude::Keyframes(at_keyword, name) => {
                let block = self.consume_block(input)?;
                Ok(CssRule::Keyframes(KeyframesRule {
                    at_keyword,
                    name,
                    block,
                }))
            },
            AtRulePrelude::Other(name, prelude) => {
                let block = self.consume_block(input)?;
                Ok(CssRule::Block(BlockRule {
                    name,
                    prelude,
                    block,
                }))
            },
        }
    }
}
