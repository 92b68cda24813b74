//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! ICE candidate attributes (RFC 5245 section 15.1).
//!
//! ```text
//! a=candidate:1995739850 1 udp 2113937151 192.168.1.65 54550 typ host generation 0
//! a=candidate:2162486046 1 udp 1845501695 85.241.121.60 60495 typ srflx raddr 192.168.1.65 rport 54550 generation 0
//! a=candidate:2564697628 1 udp 33562367 75.126.93.124 53056 typ relay raddr 85.241.121.60 rport 55027 generation 0
//! ```

use std::{fmt, str::FromStr};

use serde::Serialize;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use super::{is_number, strip_tag, AttributeParser, GrammarError, ParseError, Tokens};

pub const CANDIDATE_TAG: &str = "a=candidate";

/// Candidate priorities are positive and fit in 31 bits.
pub const MAX_PRIORITY: u32 = (1 << 31) - 1;

pub const COMPONENT_RTP: u16 = 1;
pub const COMPONENT_RTCP: u16 = 2;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr, Serialize,
)]
pub enum Protocol {
    #[strum(serialize = "udp")]
    #[serde(rename = "udp")]
    Udp,
    /// The agent opens outbound connections but accepts none.
    #[strum(serialize = "tcp-act")]
    #[serde(rename = "tcp-act")]
    TcpActive,
    /// The agent accepts inbound connections but opens none.
    #[strum(serialize = "tcp-pass")]
    #[serde(rename = "tcp-pass")]
    TcpPassive,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr, Serialize,
)]
pub enum CandidateType {
    #[strum(serialize = "host")]
    #[serde(rename = "host")]
    Host,
    #[strum(serialize = "srflx")]
    #[serde(rename = "srflx")]
    ServerReflexive,
    #[strum(serialize = "relay")]
    #[serde(rename = "relay")]
    Relay,
    #[strum(serialize = "prflx")]
    #[serde(rename = "prflx")]
    PeerReflexive,
}

impl CandidateType {
    /// Reflexive and relayed candidates name the address they were derived from.
    pub fn has_related_address(self) -> bool {
        matches!(self, Self::ServerReflexive | Self::Relay)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct RelatedAddress {
    #[serde(rename = "related_address")]
    pub address: String,
    #[serde(rename = "related_port")]
    pub port: u16,
}

/// The candidate type together with the data only some types carry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type")]
pub enum CandidateKind {
    #[serde(rename = "host")]
    Host,
    #[serde(rename = "srflx")]
    ServerReflexive(RelatedAddress),
    #[serde(rename = "relay")]
    Relay(RelatedAddress),
    #[serde(rename = "prflx")]
    PeerReflexive,
}

impl CandidateKind {
    pub fn candidate_type(&self) -> CandidateType {
        match self {
            Self::Host => CandidateType::Host,
            Self::ServerReflexive(_) => CandidateType::ServerReflexive,
            Self::Relay(_) => CandidateType::Relay,
            Self::PeerReflexive => CandidateType::PeerReflexive,
        }
    }

    pub fn related(&self) -> Option<&RelatedAddress> {
        match self {
            Self::ServerReflexive(related) | Self::Relay(related) => Some(related),
            Self::Host | Self::PeerReflexive => None,
        }
    }
}

/// One `a=candidate` line. Only obtainable through [`CandidateAttributeParser`]
/// (or `str::parse`), so every instance satisfies the line grammar.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct CandidateAttribute {
    foundation: u64,
    component_id: u16,
    protocol: Protocol,
    priority: u32,
    address: String,
    port: u16,
    #[serde(flatten)]
    kind: CandidateKind,
    generation: u32,
}

impl CandidateAttribute {
    pub fn foundation(&self) -> u64 {
        self.foundation
    }

    pub fn component_id(&self) -> u16 {
        self.component_id
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn candidate_type(&self) -> CandidateType {
        self.kind.candidate_type()
    }

    pub fn kind(&self) -> &CandidateKind {
        &self.kind
    }

    pub fn related_address(&self) -> Option<&str> {
        self.kind.related().map(|related| related.address.as_str())
    }

    pub fn related_port(&self) -> Option<u16> {
        self.kind.related().map(|related| related.port)
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for CandidateAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} {} {} {} {} {} typ {} ",
            CANDIDATE_TAG,
            self.foundation,
            self.component_id,
            self.protocol,
            self.priority,
            self.address,
            self.port,
            self.candidate_type()
        )?;
        if let Some(related) = self.kind.related() {
            write!(f, "raddr {} rport {} ", related.address, related.port)?;
        }
        write!(f, "generation {}", self.generation)
    }
}

impl FromStr for CandidateAttribute {
    type Err = GrammarError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        CandidateAttributeParser.parse(line)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CandidateAttributeParser;

impl CandidateAttributeParser {
    fn parse_payload(payload: &str) -> Result<CandidateAttribute, ParseError> {
        let mut tokens = Tokens::new(payload);

        let foundation = tokens.next_number("foundation")?;
        let component_id: u16 = tokens.next_number("component id")?;
        if component_id == 0 {
            return Err(ParseError::OutOfRange {
                field: "component id",
                value: 0,
            });
        }
        let protocol = tokens.next_token("protocol")?;
        let protocol = Protocol::from_str(protocol)
            .map_err(|_| ParseError::UnknownProtocol(protocol.to_string()))?;
        let priority: u32 = tokens.next_number("priority")?;
        if !(1..=MAX_PRIORITY).contains(&priority) {
            return Err(ParseError::OutOfRange {
                field: "priority",
                value: priority.into(),
            });
        }
        let address = tokens.next_token("address")?.to_string();
        let port = tokens.next_number("port")?;

        tokens.expect_literal("typ")?;
        let candidate_type = tokens.next_token("candidate type")?;
        let candidate_type = CandidateType::from_str(candidate_type)
            .map_err(|_| ParseError::UnknownCandidateType(candidate_type.to_string()))?;

        let kind = match candidate_type {
            CandidateType::Host => CandidateKind::Host,
            CandidateType::PeerReflexive => CandidateKind::PeerReflexive,
            CandidateType::ServerReflexive | CandidateType::Relay => {
                tokens.expect_literal("raddr")?;
                let address = tokens.next_token("related address")?.to_string();
                tokens.expect_literal("rport")?;
                let port = tokens.next_number("related port")?;
                let related = RelatedAddress { address, port };
                if candidate_type == CandidateType::Relay {
                    CandidateKind::Relay(related)
                } else {
                    CandidateKind::ServerReflexive(related)
                }
            }
        };

        tokens.expect_literal("generation")?;
        let generation = tokens.next_number("generation")?;
        tokens.finish()?;

        Ok(CandidateAttribute {
            foundation,
            component_id,
            protocol,
            priority,
            address,
            port,
            kind,
            generation,
        })
    }
}

impl AttributeParser for CandidateAttributeParser {
    type Attribute = CandidateAttribute;

    fn can_parse(&self, line: &str) -> bool {
        let Ok(payload) = strip_tag(line, CANDIDATE_TAG) else {
            return false;
        };
        let tokens = payload.split_whitespace().collect::<Vec<_>>();
        let numeric_fields_ok = [0, 1, 3, 5]
            .iter()
            .all(|&i| tokens.get(i).is_some_and(|token| is_number(token)));
        if !numeric_fields_ok || tokens.get(6) != Some(&"typ") || tokens.len() < 8 {
            return false;
        }
        let generation_index = if matches!(tokens[7], "srflx" | "relay") {
            if tokens.get(8) != Some(&"raddr")
                || tokens.get(10) != Some(&"rport")
                || !tokens.get(11).is_some_and(|token| is_number(token))
            {
                return false;
            }
            12
        } else {
            8
        };
        tokens.get(generation_index) == Some(&"generation")
            && tokens
                .get(generation_index + 1)
                .is_some_and(|token| is_number(token))
    }

    fn parse(&self, line: &str) -> Result<CandidateAttribute, GrammarError> {
        strip_tag(line, CANDIDATE_TAG)
            .and_then(Self::parse_payload)
            .map_err(|kind| GrammarError::new(line, kind))
    }
}
