//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Session description attributes needed for ICE negotiation.
//!
//! Each attribute has a parser implementing [`AttributeParser`], which turns
//! one `a=` line into a typed value. Values print back to the exact line
//! grammar through `Display`.

mod candidate;
mod ice_attributes;
pub mod ordering;
mod parser;

pub use candidate::*;
pub use ice_attributes::*;
pub use parser::*;

use thiserror::Error;

/// What was wrong with a line. See [`GrammarError`].
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum ParseError {
    #[error("line does not start with {expected}")]
    WrongTag { expected: &'static str },
    #[error("missing {field}, premature end of tokens")]
    MissingToken { field: &'static str },
    #[error("expected literal '{expected}' but found '{found}'")]
    UnexpectedLiteral {
        expected: &'static str,
        found: String,
    },
    #[error("{field} is not a valid number: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("{field} is out of range: {value}")]
    OutOfRange { field: &'static str, value: u64 },
    #[error("{field} contains invalid characters: '{value}'")]
    InvalidCharacter { field: &'static str, value: String },
    #[error("unknown transport protocol '{0}'")]
    UnknownProtocol(String),
    #[error("unknown candidate type '{0}'")]
    UnknownCandidateType(String),
    #[error("unexpected trailing tokens '{0}'")]
    TrailingTokens(String),
}

/// A line that did not match the grammar of the attribute it was parsed as.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[error("malformed attribute line {line:?}: {kind}")]
pub struct GrammarError {
    pub line: String,
    pub kind: ParseError,
}

impl GrammarError {
    pub fn new(line: &str, kind: ParseError) -> Self {
        Self {
            line: line.to_string(),
            kind,
        }
    }

    /// True if the line named a protocol or candidate type that isn't known.
    pub fn is_unknown_enumeration_value(&self) -> bool {
        matches!(
            self.kind,
            ParseError::UnknownProtocol(_) | ParseError::UnknownCandidateType(_)
        )
    }
}
