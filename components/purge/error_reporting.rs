/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Types used to report stylesheet and safelist errors.

#![deny(missing_docs)]

use std::error::Error;
use std::fmt;

use cssparser::{BasicParseErrorKind, ParseError, ParseErrorKind};

/// Errors the purge rule parser can push into cssparser's error machinery,
/// beyond the ones cssparser reports itself.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StyleParseErrorKind {
    /// A compound selector with no simple selectors in it.
    EmptySelector,
    /// A string ran into a newline or the end of the stylesheet.
    UnterminatedString,
    /// An unquoted url token was malformed.
    BadUrl,
    /// A `{ }` block was still open at the end of the stylesheet.
    UnclosedBlock,
}

impl fmt::Display for StyleParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            StyleParseErrorKind::EmptySelector => f.write_str("empty selector"),
            StyleParseErrorKind::UnterminatedString => f.write_str("unterminated string"),
            StyleParseErrorKind::BadUrl => f.write_str("invalid url"),
            StyleParseErrorKind::UnclosedBlock => f.write_str("unclosed block"),
        }
    }
}

/// A fatal failure to parse one stylesheet, with enough context to point at
/// the offending input. Parsing does not attempt recovery: the first error
/// aborts that stylesheet, though batched callers are free to continue with
/// other, independent stylesheets.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContextualParseError {
    /// Zero-based line of the offending token.
    pub line: u32,
    /// Zero-based column of the offending token.
    pub column: u32,
    /// What the parser expected to see instead.
    pub message: String,
}

impl ContextualParseError {
    pub(crate) fn from_parse_error(error: ParseError<StyleParseErrorKind>) -> Self {
        let message = match error.kind {
            ParseErrorKind::Basic(BasicParseErrorKind::UnexpectedToken(ref t)) => {
                format!("unexpected token {:?}", t)
            },
            ParseErrorKind::Basic(BasicParseErrorKind::EndOfInput) => {
                "unexpected end of input".to_owned()
            },
            ParseErrorKind::Basic(BasicParseErrorKind::AtRuleInvalid(ref name)) => {
                format!("invalid @{} rule", name)
            },
            ParseErrorKind::Basic(BasicParseErrorKind::AtRuleBodyInvalid) => {
                "invalid at-rule body".to_owned()
            },
            ParseErrorKind::Basic(BasicParseErrorKind::QualifiedRuleInvalid) => {
                "invalid style rule".to_owned()
            },
            ParseErrorKind::Custom(ref kind) => kind.to_string(),
        };
        ContextualParseError {
            line: error.location.line,
            column: error.location.column,
            message,
        }
    }
}

impl fmt::Display for ContextualParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

impl Error for ContextualParseError {}

/// A malformed safelist rule. Fatal for that rule only: the remaining rules
/// of the safelist still apply, and callers get the full list of failures
/// rather than a silent drop.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PatternError {
    /// The rule as it appeared in the safelist document.
    pub rule_text: String,
    /// Why it was rejected.
    pub message: String,
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid safelist rule {:?}: {}", self.rule_text, self.message)
    }
}

impl Error for PatternError {}
