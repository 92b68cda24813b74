//
// Copyright 2021 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

#[macro_use]
extern crate log;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use media_server::{config, inspect};
use once_cell::sync::Lazy;

// Load the config and treat it as a read-only static value.
static CONFIG: Lazy<config::Config> = Lazy::new(config::Config::parse);

#[rustfmt::skip]
fn print_config(config: &'static config::Config) {
    info!("config:");
    info!("  {:38}{}", "first_call_id:", config.first_call_id);
    info!("  {:38}{}", "registry_shards:", config.registry_shards);
    info!("  {:38}{:?}", "sdp_file:", config.sdp_file);
    info!("  {:38}{}", "json:", config.json);
}

fn inspect_sdp_file(path: &str, json: bool) -> Result<()> {
    let sdp_text =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;
    let report = inspect::inspect(&sdp_text);
    info!(
        "{}: {} candidates, {} malformed lines",
        path,
        report.candidate_count,
        report.malformed_lines.len()
    );
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging.
    env_logger::Builder::from_env(
        Env::default()
            .default_filter_or("media_server=info")
            .default_write_style_or("never"),
    )
    .format(media_common::format_log_line)
    .init();

    info!("Media Server starting up...");

    // Log information about the environment we are running in.
    info!(
        "media_server: v{}",
        option_env!("CARGO_PKG_VERSION").unwrap_or("unknown")
    );

    // Parse the command line arguments.
    let config = &CONFIG;
    print_config(config);

    match &config.sdp_file {
        Some(path) => inspect_sdp_file(path, config.json)?,
        None => info!("no session description to inspect"),
    }

    info!("shutting down");
    Ok(())
}
