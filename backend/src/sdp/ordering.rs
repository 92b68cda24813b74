//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Ordering of candidates by priority.
//!
//! A missing candidate weighs 0, so it sorts before every present one
//! (priorities are at least 1).

use std::{cmp::Ordering, collections::BTreeMap};

use itertools::Itertools;

use super::CandidateAttribute;

pub fn priority_weight(candidate: Option<&CandidateAttribute>) -> u32 {
    candidate.map_or(0, CandidateAttribute::priority)
}

/// Compares by priority weight alone. Candidates with equal priority compare
/// as equal even if every other field differs.
pub fn compare_by_priority(
    a: Option<&CandidateAttribute>,
    b: Option<&CandidateAttribute>,
) -> Ordering {
    priority_weight(a).cmp(&priority_weight(b))
}

/// Sorts ascending by priority. The sort is stable, so equal priorities
/// keep their relative order.
pub fn sort_by_priority(candidates: &mut [CandidateAttribute]) {
    candidates.sort_by_key(CandidateAttribute::priority);
}

/// Returns the candidates from most to least preferred.
pub fn ranked(candidates: &[CandidateAttribute]) -> Vec<&CandidateAttribute> {
    candidates
        .iter()
        .sorted_by(|a, b| compare_by_priority(Some(b), Some(a)))
        .collect()
}

/// The highest priority candidate of each component. On ties the one that
/// appears first wins.
pub fn best_per_component(candidates: &[CandidateAttribute]) -> BTreeMap<u16, &CandidateAttribute> {
    let mut best: BTreeMap<u16, &CandidateAttribute> = BTreeMap::new();
    for candidate in candidates {
        best.entry(candidate.component_id())
            .and_modify(|current| {
                if candidate.priority() > current.priority() {
                    *current = candidate;
                }
            })
            .or_insert(candidate);
    }
    best
}
