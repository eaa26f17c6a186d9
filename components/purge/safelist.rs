/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The safelist: the escape hatch for dynamically-constructed names.
//!
//! Class names assembled at render time by a templating layer never show up
//! in the static markup scan, and no amount of cleverness in the extractor
//! will find them. The safelist lets a project declare those names (exactly,
//! by prefix or suffix, or by regex) so the matcher treats them as used, and
//! lets whole selectors be kept verbatim with `always`.
//!
//! A safelist document is line-oriented:
//!
//! ```text
//! # names the templates build at render time
//! class modal
//! class alert-*
//! class *-open
//! id /^section-\d+$/
//! tag table
//! always .js-toggle > .panel
//! ```

use regex::Regex;
use rustc_hash::FxHashSet;

use crate::error_reporting::PatternError;
use crate::extractor::ReachableTokens;

/// Which token set a safelist pattern applies to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenKind {
    Tag,
    Class,
    Id,
}

/// One parsed safelist rule.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SafelistRule {
    /// Treat this exact token as reachable.
    Exact(TokenKind, String),
    /// Treat every token with this prefix as reachable.
    Prefix(TokenKind, String),
    /// Treat every token with this suffix as reachable.
    Suffix(TokenKind, String),
    /// Treat every token matching this regex as reachable. The pattern is
    /// kept as source text here; compilation happens in [`Safelist::compile`]
    /// so a bad pattern surfaces as a `PatternError` instead of poisoning
    /// parsing.
    Regex(TokenKind, String),
    /// Keep any rule whose selector text is exactly this, regardless of
    /// usage.
    Always(String),
}

enum PatternMatcher {
    Prefix(String),
    Suffix(String),
    Regex(Regex),
}

impl PatternMatcher {
    fn matches(&self, name: &str) -> bool {
        match *self {
            PatternMatcher::Prefix(ref prefix) => name.starts_with(prefix.as_str()),
            PatternMatcher::Suffix(ref suffix) => name.ends_with(suffix.as_str()),
            PatternMatcher::Regex(ref regex) => regex.is_match(name),
        }
    }
}

/// A compiled safelist, ready to be consulted by the matcher. Exact names
/// live in a `ReachableTokens` overlay that is unioned with the extractor's
/// result at lookup time; patterns are evaluated per queried name.
#[derive(Default)]
pub struct Safelist {
    overlay: ReachableTokens,
    patterns: Vec<(TokenKind, PatternMatcher)>,
    forced_keep: FxHashSet<String>,
}

impl Safelist {
    /// Compile a rule list. Rules with malformed regexes are reported and
    /// skipped; every other rule still takes effect.
    pub fn compile(rules: Vec<SafelistRule>) -> (Safelist, Vec<PatternError>) {
        let mut safelist = Safelist::default();
        let mut errors = Vec::new();
        for rule in rules {
            match rule {
                SafelistRule::Exact(kind, name) => {
                    safelist.overlay_set_mut(kind).insert(name);
                },
                SafelistRule::Prefix(kind, prefix) => {
                    safelist.patterns.push((kind, PatternMatcher::Prefix(prefix)));
                },
                SafelistRule::Suffix(kind, suffix) => {
                    safelist.patterns.push((kind, PatternMatcher::Suffix(suffix)));
                },
                SafelistRule::Regex(kind, pattern) => match Regex::new(&pattern) {
                    Ok(regex) => {
                        safelist.patterns.push((kind, PatternMatcher::Regex(regex)));
                    },
                    Err(error) => errors.push(PatternError {
                        rule_text: pattern,
                        message: error.to_string(),
                    }),
                },
                SafelistRule::Always(selector_text) => {
                    safelist.forced_keep.insert(selector_text.trim().to_owned());
                },
            }
        }
        (safelist, errors)
    }

    fn overlay_set_mut(&mut self, kind: TokenKind) -> &mut FxHashSet<String> {
        match kind {
            TokenKind::Tag => &mut self.overlay.tags,
            TokenKind::Class => &mut self.overlay.classes,
            TokenKind::Id => &mut self.overlay.ids,
        }
    }

    /// Whether the safelist declares this name reachable.
    pub fn allows(&self, kind: TokenKind, name: &str) -> bool {
        let set = match kind {
            TokenKind::Tag => &self.overlay.tags,
            TokenKind::Class => &self.overlay.classes,
            TokenKind::Id => &self.overlay.ids,
        };
        set.contains(name) ||
            self.patterns
                .iter()
                .any(|&(k, ref matcher)| k == kind && matcher.matches(name))
    }

    /// Whether a selector with this exact text must be kept.
    pub fn forces(&self, selector_text: &str) -> bool {
        self.forced_keep.contains(selector_text)
    }

    pub fn has_forced_keeps(&self) -> bool {
        !self.forced_keep.is_empty()
    }
}

/// Parse a safelist document. Unparseable lines become `PatternError`s and
/// the remaining lines still apply.
pub fn parse_safelist(text: &str) -> (Vec<SafelistRule>, Vec<PatternError>) {
    let mut rules = Vec::new();
    let mut errors = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_line(line) {
            Ok(rule) => rules.push(rule),
            Err(message) => errors.push(PatternError {
                rule_text: line.to_owned(),
                message,
            }),
        }
    }
    (rules, errors)
}

fn parse_line(line: &str) -> Result<SafelistRule, String> {
    let (keyword, rest) = match line.split_once(char::is_whitespace) {
        Some(parts) => parts,
        None => return Err("expected `<kind> <pattern>`".to_owned()),
    };
    let rest = rest.trim();
    if rest.is_empty() {
        return Err("missing pattern".to_owned());
    }
    if keyword.eq_ignore_ascii_case("always") {
        return Ok(SafelistRule::Always(rest.to_owned()));
    }
    let kind = if keyword.eq_ignore_ascii_case("tag") {
        TokenKind::Tag
    } else if keyword.eq_ignore_ascii_case("class") {
        TokenKind::Class
    } else if keyword.eq_ignore_ascii_case("id") {
        TokenKind::Id
    } else {
        return Err(format!("unknown token kind {:?}", keyword));
    };
    if let Some(pattern) = rest.strip_prefix('/') {
        return match pattern.strip_suffix('/') {
            Some(pattern) if !pattern.is_empty() => {
                Ok(SafelistRule::Regex(kind, pattern.to_owned()))
            },
            _ => Err("unterminated regex".to_owned()),
        };
    }
    if let Some(prefix) = rest.strip_suffix('*') {
        if prefix.contains('*') {
            return Err("at most one wildcard, at either end".to_owned());
        }
        return Ok(SafelistRule::Prefix(kind, prefix.to_owned()));
    }
    if let Some(suffix) = rest.strip_prefix('*') {
        if suffix.contains('*') {
            return Err("at most one wildcard, at either end".to_owned());
        }
        return Ok(SafelistRule::Suffix(kind, suffix.to_owned()));
    }
    if rest.contains('*') {
        return Err("wildcards are only supported at either end".to_owned());
    }
    Ok(SafelistRule::Exact(kind, rest.to_owned()))
}
