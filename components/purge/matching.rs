/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Selector usage matching: the keep/discard decision for every rule.
//!
//! Matching is conservative by construction. The extractor produces a flat
//! token set with no document structure, so descendant/child/sibling
//! relationships between compounds cannot be verified; a selector is deemed
//! satisfiable when every atomic component of it is individually reachable.
//! That over-approximation can keep a rule that no real page matches, but it
//! can never discard a rule a page needs.

use cssparser::{Parser, ParserInput, Token};
use log::debug;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::extractor::{AttrValues, ReachableTokens};
use crate::safelist::{Safelist, TokenKind};
use crate::selector_parser::{AttrSelectorOperator, Component, Selector, SelectorList};
use crate::stylesheets::{CssRule, StyleRule, Stylesheet};

/// Everything the matcher consults: the extracted corpus tokens and the
/// compiled safelist. Immutable once built, so any number of stylesheets can
/// be pruned against it concurrently.
pub struct UsageData {
    pub tokens: ReachableTokens,
    pub safelist: Safelist,
}

/// Rule counts for reporting, gathered over style rules and at-rules alike,
/// recursively.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PruneStats {
    pub rules_total: usize,
    pub rules_kept: usize,
    pub rules_removed: usize,
}

impl UsageData {
    pub fn new(tokens: ReachableTokens, safelist: Safelist) -> Self {
        UsageData { tokens, safelist }
    }

    fn tag_is_used(&self, name: &str) -> bool {
        // HTML tag names are ASCII case-insensitive; the extractor stores
        // them lowercased.
        let name = name.to_ascii_lowercase();
        self.tokens.tags.contains(&name) || self.safelist.allows(TokenKind::Tag, &name)
    }

    fn class_is_used(&self, name: &str) -> bool {
        self.tokens.classes.contains(name) || self.safelist.allows(TokenKind::Class, name)
    }

    fn id_is_used(&self, name: &str) -> bool {
        self.tokens.ids.contains(name) || self.safelist.allows(TokenKind::Id, name)
    }

    fn attribute_is_satisfiable(
        &self,
        local_name: &str,
        test: Option<(&AttrSelectorOperator, &str, bool)>,
    ) -> bool {
        match self.tokens.attrs.get(local_name) {
            None => false,
            Some(&AttrValues::Any) => true,
            Some(&AttrValues::Known(ref values)) => match test {
                None => true,
                Some((operator, expected, case_insensitive)) => {
                    if case_insensitive {
                        let expected = expected.to_ascii_lowercase();
                        values
                            .iter()
                            .any(|v| operator.eval_str(&v.to_ascii_lowercase(), &expected))
                    } else {
                        values.iter().any(|v| operator.eval_str(v, expected))
                    }
                },
            },
        }
    }

    fn selector_is_satisfiable(&self, selector: &Selector) -> bool {
        selector.components.iter().all(|component| match *component {
            // The flat token set cannot verify structure between compounds;
            // combinators are assumed satisfiable.
            Component::Combinator(_) => true,
            Component::ExplicitUniversalType => true,
            Component::LocalName(ref name) => self.tag_is_used(name),
            Component::ID(ref id) => self.id_is_used(id),
            Component::Class(ref class) => self.class_is_used(class),
            Component::AttributeExists(ref name) => self.attribute_is_satisfiable(name, None),
            Component::AttributeInNoNamespace {
                ref local_name,
                ref operator,
                ref value,
                case_insensitive,
            } => self.attribute_is_satisfiable(
                local_name,
                Some((operator, value.as_str(), case_insensitive)),
            ),
            // Pseudo-classes and pseudo-elements are structural or state
            // markers; they never make a selector unreachable.
            Component::NonTSPseudoClass(_) | Component::PseudoElement(_) => true,
        })
    }

    fn forces_keep(&self, selectors: &SelectorList) -> bool {
        if !self.safelist.has_forced_keeps() {
            return false;
        }
        self.safelist.forces(&selectors.to_css_string()) ||
            selectors
                .0
                .iter()
                .any(|selector| self.safelist.forces(&selector.text))
    }
}

/// Prune a stylesheet against the usage data.
///
/// Two passes, deliberately not folded into one traversal: the main pass
/// makes every selector-driven keep/discard decision, and only then can the
/// keyframes pass know which animation names the surviving declarations
/// reference.
pub fn prune(stylesheet: Stylesheet, usage: &UsageData) -> (Stylesheet, PruneStats) {
    let rules_total = count_rules(&stylesheet);
    let mut pruned = prune_rules(stylesheet, usage);

    let mut referenced = FxHashSet::default();
    collect_animation_names(&pruned, &mut referenced);
    retain_keyframes(&mut pruned, &referenced);

    let rules_kept = count_rules(&pruned);
    let stats = PruneStats {
        rules_total,
        rules_kept,
        rules_removed: rules_total - rules_kept,
    };
    (pruned, stats)
}

fn count_rules(stylesheet: &Stylesheet) -> usize {
    stylesheet
        .rules
        .iter()
        .map(|rule| match *rule {
            CssRule::Conditional(ref rule) => 1 + count_rules(&rule.stylesheet),
            _ => 1,
        })
        .sum()
}

fn prune_rules(stylesheet: Stylesheet, usage: &UsageData) -> Stylesheet {
    let mut kept = Vec::with_capacity(stylesheet.rules.len());
    for rule in stylesheet.rules {
        match rule {
            CssRule::Style(rule) => {
                if let Some(rule) = prune_style_rule(rule, usage) {
                    kept.push(CssRule::Style(rule));
                }
            },
            CssRule::Conditional(mut rule) => {
                rule.stylesheet = prune_rules(rule.stylesheet, usage);
                // An empty conditional block is dead weight.
                if rule.stylesheet.rules.is_empty() {
                    debug!("dropping empty @{} block", rule.name);
                } else {
                    kept.push(CssRule::Conditional(rule));
                }
            },
            // Resolved by the keyframes pass, after this one.
            CssRule::Keyframes(rule) => kept.push(CssRule::Keyframes(rule)),
            // Not presentation rules keyed on markup usage: always kept.
            rule @ CssRule::Block(_) | rule @ CssRule::Statement(_) => kept.push(rule),
        }
    }
    Stylesheet { rules: kept }
}

fn prune_style_rule(rule: StyleRule, usage: &UsageData) -> Option<StyleRule> {
    if usage.forces_keep(&rule.selectors) {
        return Some(rule);
    }
    let StyleRule { selectors, block } = rule;
    let kept: SmallVec<[Selector; 1]> = selectors
        .0
        .into_iter()
        .filter(|selector| {
            let satisfiable = usage.selector_is_satisfiable(selector);
            if !satisfiable {
                debug!("dropping selector `{}`", selector.text);
            }
            satisfiable
        })
        .collect();
    if kept.is_empty() {
        return None;
    }
    Some(StyleRule {
        selectors: SelectorList(kept),
        block,
    })
}

/// Collect every animation name referenced by `animation`/`animation-name`
/// declarations (vendor-prefixed forms included) of the surviving style
/// rules. Every identifier and string in such a declaration's value counts:
/// distinguishing a name from a timing keyword would make removal less
/// conservative for no gain.
fn collect_animation_names(stylesheet: &Stylesheet, names: &mut FxHashSet<String>) {
    for rule in &stylesheet.rules {
        match *rule {
            CssRule::Style(ref rule) => scan_animation_names(&rule.block, names),
            CssRule::Conditional(ref rule) => collect_animation_names(&rule.stylesheet, names),
            _ => {},
        }
    }
}

fn scan_animation_names(block: &str, names: &mut FxHashSet<String>) {
    let mut input = ParserInput::new(block);
    let mut parser = Parser::new(&mut input);
    loop {
        let token = match parser.next() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        let property = match token {
            Token::Ident(name) => name,
            _ => continue,
        };
        if !is_animation_property(&property) {
            continue;
        }
        match parser.next() {
            Ok(&Token::Colon) => {},
            _ => continue,
        }
        loop {
            let token = match parser.next() {
                Ok(token) => token.clone(),
                Err(_) => return,
            };
            match token {
                Token::Semicolon => break,
                Token::Ident(name) => {
                    names.insert(name.as_ref().to_owned());
                },
                Token::QuotedString(name) => {
                    names.insert(name.as_ref().to_owned());
                },
                _ => {},
            }
        }
    }
}

fn is_animation_property(name: &str) -> bool {
    // Strip a vendor prefix, `-webkit-animation` style.
    let name = match name.strip_prefix('-') {
        Some(rest) => match rest.split_once('-') {
            Some((_, unprefixed)) => unprefixed,
            None => rest,
        },
        None => name,
    };
    name.eq_ignore_ascii_case("animation") || name.eq_ignore_ascii_case("animation-name")
}

fn retain_keyframes(stylesheet: &mut Stylesheet, referenced: &FxHashSet<String>) {
    stylesheet.rules.retain_mut(|rule| match *rule {
        CssRule::Keyframes(ref rule) => {
            let kept = referenced.contains(&rule.name);
            if !kept {
                debug!("dropping unreferenced @{} {}", rule.at_keyword, rule.name);
            }
            kept
        },
        CssRule::Conditional(ref mut rule) => {
            retain_keyframes(&mut rule.stylesheet, referenced);
            // Keyframes removal can empty a conditional block that survived
            // the main pass.
            !rule.stylesheet.rules.is_empty()
        },
        _ => true,
    });
}
