/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Markup token extraction.
//!
//! Scans markup documents for the tokens a selector could possibly refer to:
//! tag names, class names, ids, and attribute name/value pairs. Extraction is
//! purely lexical over the markup syntax; nothing is rendered or executed, so
//! attribute values assembled by template interpolation are invisible here.
//! That gap is covered by the safelist (see the `safelist` module), not by
//! guessing.

use std::cell::RefCell;
use std::collections::hash_map::Entry;

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use log::warn;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

/// The values observed for one attribute name across the corpus.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AttrValues {
    /// The attribute was seen with a value that cannot be resolved
    /// statically (template interpolation). Any value test succeeds.
    Any,
    /// The literal values seen.
    Known(FxHashSet<String>),
}

/// The set of tokens reachable from the markup corpus. Built once per run
/// and read-only during matching.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReachableTokens {
    pub tags: FxHashSet<String>,
    pub classes: FxHashSet<String>,
    pub ids: FxHashSet<String>,
    pub attrs: FxHashMap<String, AttrValues>,
}

impl ReachableTokens {
    /// Set union. Commutative and associative, so parallel extraction can
    /// combine per-document results in any order.
    pub fn union(mut self, other: ReachableTokens) -> ReachableTokens {
        self.tags.extend(other.tags);
        self.classes.extend(other.classes);
        self.ids.extend(other.ids);
        for (name, values) in other.attrs {
            match self.attrs.entry(name) {
                Entry::Vacant(entry) => {
                    entry.insert(values);
                },
                Entry::Occupied(mut entry) => match (entry.get_mut(), values) {
                    (AttrValues::Any, _) => {},
                    (slot, AttrValues::Any) => *slot = AttrValues::Any,
                    (AttrValues::Known(mine), AttrValues::Known(theirs)) => {
                        mine.extend(theirs);
                    },
                },
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() &&
            self.classes.is_empty() &&
            self.ids.is_empty() &&
            self.attrs.is_empty()
    }

    fn add_attribute(&mut self, name: &str, value: &str) {
        let slot = self
            .attrs
            .entry(name.to_owned())
            .or_insert_with(|| AttrValues::Known(FxHashSet::default()));
        if has_interpolation(value) {
            *slot = AttrValues::Any;
        } else if let AttrValues::Known(values) = slot {
            values.insert(value.to_owned());
        }
    }
}

const INTERPOLATION_DELIMITERS: [(&str, &str); 3] = [("{{", "}}"), ("{%", "%}"), ("${", "}")];

fn find_interpolation(text: &str) -> Option<(usize, &'static str, &'static str)> {
    INTERPOLATION_DELIMITERS
        .iter()
        .filter_map(|&(open, close)| text.find(open).map(|index| (index, open, close)))
        .min_by_key(|&(index, ..)| index)
}

/// Whether a value contains template-interpolation syntax and therefore
/// cannot be trusted as a literal.
fn has_interpolation(value: &str) -> bool {
    find_interpolation(value).is_some()
}

/// Remove interpolated spans from a value, leaving the literal fragments.
/// Each removed span acts as a token boundary. An unterminated span swallows
/// the rest of the value.
fn strip_interpolation(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some((index, open, close)) = find_interpolation(rest) {
        out.push_str(&rest[..index]);
        out.push(' ');
        rest = match rest[index + open.len()..].find(close) {
            Some(end) => &rest[index + open.len() + end + close.len()..],
            None => "",
        };
    }
    out.push_str(rest);
    out
}

struct TokenExtractor {
    tokens: RefCell<ReachableTokens>,
}

impl TokenSink for TokenExtractor {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        if let Token::TagToken(tag) = token {
            if tag.kind == TagKind::StartTag {
                let mut tokens = self.tokens.borrow_mut();
                tokens.tags.insert(tag.name.to_string());
                for attr in &tag.attrs {
                    let name: &str = &attr.name.local;
                    let value: &str = &attr.value;
                    match name {
                        "class" => {
                            if has_interpolation(value) {
                                for class in strip_interpolation(value).split_ascii_whitespace() {
                                    tokens.classes.insert(class.to_owned());
                                }
                            } else {
                                for class in value.split_ascii_whitespace() {
                                    tokens.classes.insert(class.to_owned());
                                }
                            }
                        },
                        "id" => {
                            let id = value.trim();
                            if !id.is_empty() && !has_interpolation(id) {
                                tokens.ids.insert(id.to_owned());
                            }
                        },
                        _ => tokens.add_attribute(name, value),
                    }
                }
            }
        }
        TokenSinkResult::Continue
    }
}

/// Extract the reachable tokens of a single markup document.
pub fn extract_document(markup: &str) -> ReachableTokens {
    let sink = TokenExtractor {
        tokens: RefCell::new(ReachableTokens::default()),
    };
    let tokenizer = Tokenizer::new(sink, TokenizerOpts::default());
    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(markup));
    let _ = tokenizer.feed(&input);
    tokenizer.end();
    tokenizer.sink.tokens.into_inner()
}

/// Extract the reachable tokens of a whole corpus. Documents are independent,
/// so they are tokenized in parallel and the results unioned.
pub fn extract_corpus<D>(documents: &[D]) -> ReachableTokens
where
    D: AsRef<str> + Sync,
{
    if documents.is_empty() {
        warn!(
            "no markup documents supplied; every rule without a safelist entry \
             will be discarded"
        );
        return ReachableTokens::default();
    }
    documents
        .par_iter()
        .map(|document| extract_document(document.as_ref()))
        .reduce(ReachableTokens::default, ReachableTokens::union)
}
