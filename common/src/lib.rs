//
// Copyright 2021 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Common functionality shared by the media server crates.

mod call_ids;
mod collections;

use std::io::Write;

pub use call_ids::*;
pub use collections::*;

// Allows using `?` syntax in a scope and collecting failures in a `Result`.
pub fn try_scoped<T>(call: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
    call()
}

/// Log line format shared by every binary in the workspace, for use with
/// [`env_logger::Builder::format`].
pub fn format_log_line(
    buf: &mut env_logger::fmt::Formatter,
    record: &log::Record,
) -> std::io::Result<()> {
    writeln!(
        buf,
        "{} {:<5} {}:{} {}",
        buf.timestamp_millis(),
        record.level(),
        record.target(),
        record.line().unwrap_or(0),
        record.args()
    )
}
