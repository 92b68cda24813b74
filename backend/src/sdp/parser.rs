//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

use std::{str::FromStr, str::SplitWhitespace};

use super::{GrammarError, ParseError};

/// Recognizes and parses one kind of session description attribute line.
pub trait AttributeParser {
    type Attribute;

    /// A cheap check of the line's tag and token shape. A true result does
    /// not guarantee that [`Self::parse`] succeeds.
    fn can_parse(&self, line: &str) -> bool;

    /// Fully tokenizes and validates the line.
    fn parse(&self, line: &str) -> Result<Self::Attribute, GrammarError>;

    /// Overwrites every field of `attribute` from `line`.
    ///
    /// The line is validated into a new value before anything is assigned,
    /// so on error `attribute` keeps its previous value.
    fn parse_into(&self, attribute: &mut Self::Attribute, line: &str) -> Result<(), GrammarError> {
        let parsed = self.parse(line)?;
        *attribute = parsed;
        Ok(())
    }
}

/// Returns the payload following `tag`, which must be followed by either
/// `:` or the end of the line. The payload is empty for value-less lines.
pub(crate) fn strip_tag<'a>(line: &'a str, tag: &'static str) -> Result<&'a str, ParseError> {
    let rest = line
        .strip_prefix(tag)
        .ok_or(ParseError::WrongTag { expected: tag })?;
    if rest.is_empty() {
        Ok(rest)
    } else {
        rest.strip_prefix(':')
            .ok_or(ParseError::WrongTag { expected: tag })
    }
}

/// True for a non-empty run of ASCII digits. No signs, no whitespace.
pub(crate) fn is_number(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// Strictly positional whitespace tokenizer for attribute payloads.
pub struct Tokens<'a> {
    inner: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    pub fn new(payload: &'a str) -> Self {
        Self {
            inner: payload.split_whitespace(),
        }
    }

    pub fn next_token(&mut self, field: &'static str) -> Result<&'a str, ParseError> {
        self.inner.next().ok_or(ParseError::MissingToken { field })
    }

    pub fn next_number<T: FromStr>(&mut self, field: &'static str) -> Result<T, ParseError> {
        let token = self.next_token(field)?;
        let invalid = || ParseError::InvalidNumber {
            field,
            value: token.to_string(),
        };
        if !is_number(token) {
            return Err(invalid());
        }
        token.parse().map_err(|_| invalid())
    }

    /// Consumes a keyword token. Its absence or any other token is an error.
    pub fn expect_literal(&mut self, literal: &'static str) -> Result<(), ParseError> {
        let token = self.next_token(literal)?;
        if token == literal {
            Ok(())
        } else {
            Err(ParseError::UnexpectedLiteral {
                expected: literal,
                found: token.to_string(),
            })
        }
    }

    /// Fails if any tokens are left over.
    pub fn finish(mut self) -> Result<(), ParseError> {
        let rest = self.inner.by_ref().collect::<Vec<_>>();
        if rest.is_empty() {
            Ok(())
        } else {
            Err(ParseError::TrailingTokens(rest.join(" ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tag() {
        assert_eq!(Ok("1 2"), strip_tag("a=candidate:1 2", "a=candidate"));
        assert_eq!(Ok(""), strip_tag("a=ice-lite", "a=ice-lite"));
        assert_eq!(
            Err(ParseError::WrongTag {
                expected: "a=candidate"
            }),
            strip_tag("a=candidates:1", "a=candidate")
        );
        assert_eq!(
            Err(ParseError::WrongTag {
                expected: "a=candidate"
            }),
            strip_tag("a=ice-ufrag:abcd", "a=candidate")
        );
    }

    #[test]
    fn test_tokens() {
        let mut tokens = Tokens::new("12  typ\tx 70000");
        assert_eq!(Ok(12u32), tokens.next_number("first"));
        assert_eq!(Ok(()), tokens.expect_literal("typ"));
        assert_eq!(
            Err(ParseError::InvalidNumber {
                field: "second",
                value: "x".to_string()
            }),
            tokens.next_number::<u32>("second")
        );
        assert_eq!(
            Err(ParseError::InvalidNumber {
                field: "port",
                value: "70000".to_string()
            }),
            tokens.next_number::<u16>("port")
        );
        assert_eq!(
            Err(ParseError::MissingToken { field: "generation" }),
            tokens.expect_literal("generation")
        );
        assert_eq!(Ok(()), tokens.finish());
    }

    #[test]
    fn test_numbers_are_plain_digits() {
        assert!(is_number("0"));
        assert!(is_number("2113937151"));
        assert!(!is_number(""));
        assert!(!is_number("+5"));
        assert!(!is_number("-5"));
        assert!(!is_number("5x"));

        let mut tokens = Tokens::new("+12 007");
        assert_eq!(
            Err(ParseError::InvalidNumber {
                field: "first",
                value: "+12".to_string()
            }),
            tokens.next_number::<u32>("first")
        );
        assert_eq!(Ok(7u32), tokens.next_number("second"));
    }

    #[test]
    fn test_tokens_trailing() {
        let mut tokens = Tokens::new("raddr 1 2");
        assert_eq!(
            Err(ParseError::UnexpectedLiteral {
                expected: "rport",
                found: "raddr".to_string()
            }),
            tokens.expect_literal("rport")
        );
        assert_eq!(
            Err(ParseError::TrailingTokens("1 2".to_string())),
            tokens.finish()
        );
    }
}
