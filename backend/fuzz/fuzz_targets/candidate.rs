//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

#![no_main]

use libfuzzer_sys::fuzz_target;
use media_common::try_scoped;
use media_server::sdp::{AttributeParser, CandidateAttributeParser};

fuzz_target!(|data: &[u8]| {
    let _ = try_scoped(|| {
        let line = std::str::from_utf8(data)?;
        let parser = CandidateAttributeParser;
        let _ = parser.can_parse(line);
        let candidate = parser.parse(line)?;

        let printed = candidate.to_string();
        let reparsed = parser.parse(&printed)?;
        assert_eq!(candidate, reparsed, "{:?} printed as {:?}", line, printed);
        assert_eq!(
            candidate.related_address().is_some(),
            candidate.candidate_type().has_related_address()
        );

        // A failed overwrite leaves the value alone.
        let mut overwritten = reparsed;
        assert!(parser.parse_into(&mut overwritten, "a=candidate:").is_err());
        assert_eq!(candidate, overwritten);
        Ok(())
    });
});
