//
// Copyright 2021 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Configuration options for the media server.

use clap;

/// General configuration options, set by command line arguments or
/// falls back to default values.
#[derive(Default, clap::Parser, Debug, Clone)]
#[clap(name = "media_server")]
pub struct Config {
    /// The id given to the first call. Later calls count up from here.
    #[clap(long, default_value = "1")]
    pub first_call_id: u32,

    /// The number of shards of each connection registry. More shards means
    /// less contention between connections of the same call.
    #[clap(long, default_value = "16")]
    pub registry_shards: usize,

    /// A session description to inspect for ICE attributes.
    #[clap(long)]
    pub sdp_file: Option<String>,

    /// Print the inspection result as JSON.
    #[clap(long)]
    pub json: bool,
}

#[cfg(test)]
pub(crate) fn default_test_config() -> Config {
    Config {
        first_call_id: 1,
        registry_shards: 4,
        sdp_file: None,
        json: false,
    }
}
