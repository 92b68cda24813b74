//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Summarizes the ICE attributes of a session description.

use std::{collections::BTreeMap, fmt};

use log::*;
use serde::Serialize;

use crate::sdp::{self, ordering, CandidateAttribute};

#[derive(Debug, Serialize)]
pub struct SdpReport {
    pub ufrag: Option<String>,
    pub ice_lite: bool,
    pub candidate_count: usize,
    /// The most preferred candidate of each component.
    pub best_candidates: BTreeMap<u16, CandidateAttribute>,
    pub malformed_lines: Vec<String>,
}

pub fn inspect(sdp_text: &str) -> SdpReport {
    let attributes = sdp::parse_session_ice_attributes(sdp_text);
    for err in &attributes.errors {
        warn!("{}", err);
    }
    let best_candidates = ordering::best_per_component(&attributes.candidates)
        .into_iter()
        .map(|(component_id, candidate)| (component_id, candidate.clone()))
        .collect();
    SdpReport {
        ufrag: attributes.ufrag.map(|ufrag| ufrag.ufrag().to_string()),
        ice_lite: attributes.lite,
        candidate_count: attributes.candidates.len(),
        best_candidates,
        malformed_lines: attributes.errors.into_iter().map(|err| err.line).collect(),
    }
}

impl fmt::Display for SdpReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ufrag:      {}", self.ufrag.as_deref().unwrap_or("-"))?;
        writeln!(f, "ice-lite:   {}", self.ice_lite)?;
        writeln!(f, "candidates: {}", self.candidate_count)?;
        for (component_id, candidate) in &self.best_candidates {
            writeln!(f, "best for component {}: {}", component_id, candidate)?;
        }
        for line in &self.malformed_lines {
            writeln!(f, "malformed: {}", line)?;
        }
        Ok(())
    }
}
