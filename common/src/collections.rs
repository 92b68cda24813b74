//
// Copyright 2021 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

mod concurrent_map;

pub use concurrent_map::*;
