/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Dead CSS rule removal.
//!
//! Given a stylesheet and a corpus of markup documents, this crate decides
//! which rules the markup can possibly reach and serializes a stylesheet
//! containing only those. The pipeline:
//!
//! * [`stylesheets`] parses the stylesheet, keeping declaration blocks as
//!   verbatim text;
//! * [`extractor`] scans the markup corpus into a flat set of reachable
//!   tokens;
//! * [`safelist`] merges in names the markup scan cannot see (the
//!   dynamic-class escape hatch);
//! * [`matching`] makes the conservative keep/discard decision per rule and
//!   resolves `@keyframes` references in a second pass.
//!
//! The core is pure and synchronous: no I/O, no shared mutable state. One
//! [`UsageData`] can serve any number of concurrent [`purge_stylesheet`]
//! calls.

pub mod error_reporting;
pub mod extractor;
pub mod matching;
pub mod safelist;
pub mod selector_parser;
pub mod stylesheets;

pub use crate::error_reporting::{ContextualParseError, PatternError};
pub use crate::extractor::{extract_corpus, extract_document, ReachableTokens};
pub use crate::matching::{prune, PruneStats, UsageData};
pub use crate::safelist::{parse_safelist, Safelist, SafelistRule, TokenKind};
pub use crate::stylesheets::Stylesheet;

/// What one stylesheet run reports back to the caller.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PurgeSummary {
    pub rules_total: usize,
    pub rules_kept: usize,
    pub bytes_before: usize,
    pub bytes_after: usize,
}

/// The pruned stylesheet text and its summary.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PurgeOutput {
    pub css: String,
    pub summary: PurgeSummary,
}

/// Parse, prune, and re-serialize one stylesheet against the usage data.
///
/// A parse failure is fatal for this stylesheet only; batch callers should
/// report it and continue with their remaining inputs.
pub fn purge_stylesheet(
    css: &str,
    usage: &UsageData,
) -> Result<PurgeOutput, ContextualParseError> {
    let stylesheet = Stylesheet::from_str(css)?;
    let (pruned, stats) = prune(stylesheet, usage);
    let output = pruned.to_css_string();
    Ok(PurgeOutput {
        summary: PurgeSummary {
            rules_total: stats.rules_total,
            rules_kept: stats.rules_kept,
            bytes_before: css.len(),
            bytes_after: output.len(),
        },
        css: output,
    })
}
