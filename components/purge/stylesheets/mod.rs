/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Stylesheet parsing, the rule tree it produces, and its serialization.
//!
//! Declaration blocks are deliberately not parsed into property declarations:
//! pruning never depends on declaration content, so every `{ }` body is kept
//! as the verbatim source text between the braces and re-emitted unchanged.

pub mod rule_parser;

use std::fmt::{self, Write};

use cssparser::{Parser, ParserInput, StyleSheetParser};

use crate::error_reporting::ContextualParseError;
use crate::selector_parser::SelectorList;
use self::rule_parser::TopLevelRuleParser;

/// An ordered sequence of CSS rules. Owns its rules, which own any nested
/// stylesheets in turn: the whole structure is a tree.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Stylesheet {
    /// The rules, in source order.
    pub rules: Vec<CssRule>,
}

/// One top-level or nested rule.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CssRule {
    Style(StyleRule),
    Keyframes(KeyframesRule),
    Conditional(ConditionalRule),
    Block(BlockRule),
    Statement(StatementRule),
}

/// A style rule: a selector list and its verbatim declaration block.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StyleRule {
    pub selectors: SelectorList,
    /// The text between the rule's braces, unparsed.
    pub block: String,
}

/// A `@keyframes` rule (possibly vendor-prefixed). The body is opaque: its
/// inner selectors are percentage offsets, not usage selectors, so the rule
/// is kept or dropped as a unit based on whether its name is referenced by
/// an animation declaration of a surviving style rule.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyframesRule {
    /// The at-keyword as written, e.g. `keyframes` or `-webkit-keyframes`.
    pub at_keyword: String,
    /// The animation name.
    pub name: String,
    /// The verbatim body.
    pub block: String,
}

/// A conditional group rule whose body is a nested rule list: `@media`,
/// `@supports`, `@document` and a block-form `@layer`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConditionalRule {
    /// The at-keyword as written, without the `@`.
    pub name: String,
    /// The verbatim condition text. Conditions are never evaluated here;
    /// whether a condition can hold at runtime is not knowable statically.
    pub condition: String,
    pub stylesheet: Stylesheet,
}

/// A block at-rule whose body is a declaration list (`@font-face`, `@page`,
/// `@counter-style`, `@property`, and anything unrecognized). These are not
/// presentation rules keyed on markup usage and are always kept.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BlockRule {
    pub name: String,
    pub prelude: String,
    pub block: String,
}

/// A block-less at-rule: `@import`, `@charset`, `@namespace`, statement-form
/// `@layer`. Always kept.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatementRule {
    pub name: String,
    pub prelude: String,
}

impl Stylesheet {
    /// Parse a stylesheet from a string.
    ///
    /// Unlike a browser's CSS parser this does not recover from errors by
    /// skipping the invalid rule: a stylesheet we cannot fully understand is
    /// a stylesheet we cannot safely prune, so the first error is fatal for
    /// this stylesheet.
    pub fn from_str(css: &str) -> Result<Self, ContextualParseError> {
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        let mut rule_parser = TopLevelRuleParser::new(css);
        let mut rules = Vec::new();
        {
            let mut iter = StyleSheetParser::new(&mut parser, &mut rule_parser);
            while let Some(result) = iter.next() {
                match result {
                    Ok(rule) => rules.push(rule),
                    Err((error, _)) => {
                        return Err(ContextualParseError::from_parse_error(error))
                    },
                }
            }
        }
        Ok(Stylesheet { rules })
    }

    /// Serialize the stylesheet. Output is deterministic: rules are emitted
    /// in source order and block bodies byte-for-byte as they were parsed.
    pub fn to_css<W: Write>(&self, dest: &mut W) -> fmt::Result {
        let mut first = true;
        for rule in &self.rules {
            if !first {
                dest.write_str("\n")?;
            }
            first = false;
            rule.to_css(dest)?;
        }
        Ok(())
    }

    pub fn to_css_string(&self) -> String {
        let mut result = String::new();
        self.to_css(&mut result).unwrap();
        result
    }
}

impl CssRule {
    pub fn to_css<W: Write>(&self, dest: &mut W) -> fmt::Result {
        match *self {
            CssRule::Style(ref rule) => {
                rule.selectors.to_css(dest)?;
                dest.write_str(" {")?;
                dest.write_str(&rule.block)?;
                dest.write_str("}")
            },
            CssRule::Keyframes(ref rule) => {
                write!(dest, "@{} {} {{", rule.at_keyword, rule.name)?;
                dest.write_str(&rule.block)?;
                dest.write_str("}")
            },
            CssRule::Conditional(ref rule) => {
                dest.write_str("@")?;
                dest.write_str(&rule.name)?;
                if !rule.condition.is_empty() {
                    dest.write_str(" ")?;
                    dest.write_str(&rule.condition)?;
                }
                dest.write_str(" {\n")?;
                rule.stylesheet.to_css(dest)?;
                dest.write_str("\n}")
            },
            CssRule::Block(ref rule) => {
                dest.write_str("@")?;
                dest.write_str(&rule.name)?;
                if !rule.prelude.is_empty() {
                    dest.write_str(" ")?;
                    dest.write_str(&rule.prelude)?;
                }
                dest.write_str(" {")?;
                dest.write_str(&rule.block)?;
                dest.write_str("}")
            },
            CssRule::Statement(ref rule) => {
                dest.write_str("@")?;
                dest.write_str(&rule.name)?;
                if !rule.prelude.is_empty() {
                    dest.write_str(" ")?;
                    dest.write_str(&rule.prelude)?;
                }
                dest.write_str(";")
            },
        }
    }
}
