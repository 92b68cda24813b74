//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

#![no_main]

use libfuzzer_sys::fuzz_target;
use media_server::{inspect, sdp::ordering};

fuzz_target!(|sdp_text: &str| {
    let report = inspect::inspect(sdp_text);
    for (component_id, best) in &report.best_candidates {
        assert_eq!(*component_id, best.component_id());
    }

    if let Ok(mut candidates) = media_server::sdp::parse_session_candidates(sdp_text) {
        ordering::sort_by_priority(&mut candidates);
        assert!(candidates
            .windows(2)
            .all(|pair| pair[0].priority() <= pair[1].priority()));
    }
});
