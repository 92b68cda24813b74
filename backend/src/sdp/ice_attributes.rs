//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

use std::fmt;

use log::*;
use serde::Serialize;

use super::{
    strip_tag, AttributeParser, CandidateAttribute, CandidateAttributeParser, GrammarError,
    ParseError, Tokens,
};

pub const ICE_UFRAG_TAG: &str = "a=ice-ufrag";
pub const ICE_PWD_TAG: &str = "a=ice-pwd";
pub const ICE_LITE_TAG: &str = "a=ice-lite";

// ice-char = ALPHA / DIGIT / "+" / "/"
fn is_ice_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '+' || c == '/'
}

fn parse_ice_chars(payload: &str, field: &'static str) -> Result<String, ParseError> {
    let mut tokens = Tokens::new(payload);
    let value = tokens.next_token(field)?;
    tokens.finish()?;
    if !value.chars().all(is_ice_char) {
        return Err(ParseError::InvalidCharacter {
            field,
            value: value.to_string(),
        });
    }
    Ok(value.to_string())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IceUfragAttribute(String);

impl IceUfragAttribute {
    pub fn ufrag(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IceUfragAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", ICE_UFRAG_TAG, self.0)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct IceUfragAttributeParser;

impl AttributeParser for IceUfragAttributeParser {
    type Attribute = IceUfragAttribute;

    fn can_parse(&self, line: &str) -> bool {
        strip_tag(line, ICE_UFRAG_TAG).is_ok_and(|payload| !payload.trim().is_empty())
    }

    fn parse(&self, line: &str) -> Result<IceUfragAttribute, GrammarError> {
        strip_tag(line, ICE_UFRAG_TAG)
            .and_then(|payload| parse_ice_chars(payload, "ufrag"))
            .map(IceUfragAttribute)
            .map_err(|kind| GrammarError::new(line, kind))
    }
}

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct IcePwdAttribute(String);

impl IcePwdAttribute {
    pub fn pwd(&self) -> &str {
        &self.0
    }
}

// Keep the password out of logs.
impl fmt::Debug for IcePwdAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IcePwdAttribute(<{} chars>)", self.0.len())
    }
}

impl fmt::Display for IcePwdAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", ICE_PWD_TAG, self.0)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct IcePwdAttributeParser;

impl AttributeParser for IcePwdAttributeParser {
    type Attribute = IcePwdAttribute;

    fn can_parse(&self, line: &str) -> bool {
        strip_tag(line, ICE_PWD_TAG).is_ok_and(|payload| !payload.trim().is_empty())
    }

    fn parse(&self, line: &str) -> Result<IcePwdAttribute, GrammarError> {
        strip_tag(line, ICE_PWD_TAG)
            .and_then(|payload| parse_ice_chars(payload, "pwd"))
            .map(IcePwdAttribute)
            .map_err(|kind| GrammarError::new(line, kind))
    }
}

/// `a=ice-lite` is a flag and carries no value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct IceLiteAttribute;

impl fmt::Display for IceLiteAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(ICE_LITE_TAG)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct IceLiteAttributeParser;

impl AttributeParser for IceLiteAttributeParser {
    type Attribute = IceLiteAttribute;

    fn can_parse(&self, line: &str) -> bool {
        line.trim_end() == ICE_LITE_TAG
    }

    fn parse(&self, line: &str) -> Result<IceLiteAttribute, GrammarError> {
        strip_tag(line, ICE_LITE_TAG)
            .and_then(|payload| Tokens::new(payload).finish())
            .map(|_| IceLiteAttribute)
            .map_err(|kind| GrammarError::new(line, kind))
    }
}

/// Any of the ICE attributes this module knows how to parse.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "attribute", content = "value", rename_all = "snake_case")]
pub enum IceAttribute {
    Candidate(CandidateAttribute),
    Ufrag(IceUfragAttribute),
    Pwd(IcePwdAttribute),
    Lite,
}

fn has_tag(line: &str, tag: &str) -> bool {
    line.strip_prefix(tag)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(':'))
}

impl IceAttribute {
    /// Parses a line if it is tagged as one of the known ICE attributes.
    ///
    /// Returns `Ok(None)` for lines with any other tag and an error for a
    /// known tag whose payload does not match the grammar.
    pub fn parse_line(line: &str) -> Result<Option<IceAttribute>, GrammarError> {
        let line = line.trim_end();
        if has_tag(line, super::CANDIDATE_TAG) {
            CandidateAttributeParser
                .parse(line)
                .map(|candidate| Some(Self::Candidate(candidate)))
        } else if has_tag(line, ICE_UFRAG_TAG) {
            IceUfragAttributeParser
                .parse(line)
                .map(|ufrag| Some(Self::Ufrag(ufrag)))
        } else if has_tag(line, ICE_PWD_TAG) {
            IcePwdAttributeParser
                .parse(line)
                .map(|pwd| Some(Self::Pwd(pwd)))
        } else if has_tag(line, ICE_LITE_TAG) {
            IceLiteAttributeParser.parse(line).map(|_| Some(Self::Lite))
        } else {
            Ok(None)
        }
    }
}

impl fmt::Display for IceAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Candidate(candidate) => candidate.fmt(f),
            Self::Ufrag(ufrag) => ufrag.fmt(f),
            Self::Pwd(pwd) => pwd.fmt(f),
            Self::Lite => IceLiteAttribute.fmt(f),
        }
    }
}

/// The ICE attributes found in a whole session description.
#[derive(Debug, Default)]
pub struct SessionIceAttributes {
    pub candidates: Vec<CandidateAttribute>,
    pub ufrag: Option<IceUfragAttribute>,
    pub pwd: Option<IcePwdAttribute>,
    pub lite: bool,
    /// Lines that carried a known ICE tag but failed to parse.
    pub errors: Vec<GrammarError>,
}

/// Collects the ICE attributes of a session description, line by line.
///
/// A malformed line is recorded in `errors` and does not prevent the other
/// lines from being read. Later ufrag/pwd lines override earlier ones, as
/// media-level attributes override session-level ones.
pub fn parse_session_ice_attributes(sdp: &str) -> SessionIceAttributes {
    let mut attributes = SessionIceAttributes::default();
    for line in sdp.lines() {
        match IceAttribute::parse_line(line) {
            Ok(Some(IceAttribute::Candidate(candidate))) => attributes.candidates.push(candidate),
            Ok(Some(IceAttribute::Ufrag(ufrag))) => attributes.ufrag = Some(ufrag),
            Ok(Some(IceAttribute::Pwd(pwd))) => attributes.pwd = Some(pwd),
            Ok(Some(IceAttribute::Lite)) => attributes.lite = true,
            Ok(None) => {}
            Err(err) => {
                debug!("skipping ICE attribute: {}", err);
                attributes.errors.push(err);
            }
        }
    }
    attributes
}

/// Parses every candidate line of a session description, failing on the
/// first malformed one.
pub fn parse_session_candidates(sdp: &str) -> Result<Vec<CandidateAttribute>, GrammarError> {
    sdp.lines()
        .map(str::trim_end)
        .filter(|line| has_tag(line, super::CANDIDATE_TAG))
        .map(|line| CandidateAttributeParser.parse(line))
        .collect()
}
