//
// Copyright 2021 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

pub mod call;
pub mod call_manager;
pub mod config;
pub mod connection;
pub mod frame;
pub mod inspect;
pub mod pipeline;
pub mod sdp;
