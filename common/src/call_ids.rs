//
// Copyright 2023 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

use std::fmt;

/// Identifies a call within one call manager. Allocated monotonically, so an
/// id is never handed out twice during the manager's lifetime.
#[derive(Clone, Debug, Eq, PartialEq, Copy, Hash, PartialOrd, Ord)]
pub struct CallId(u32);

impl CallId {
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// For testing
    pub const fn from_const(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<u32> for CallId {
    fn from(call_id: u32) -> Self {
        Self(call_id)
    }
}

impl From<CallId> for u32 {
    fn from(call_id: CallId) -> u32 {
        call_id.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Uniquely identifies a connection within its call.
#[derive(Clone, Debug, Eq, PartialEq, Copy, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u32);

impl ConnectionId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

#[derive(thiserror::Error, Debug, Eq, PartialEq)]
#[error("Invalid connection ID: {0:?}")]
pub struct InvalidConnectionIdError(String);

impl From<u32> for ConnectionId {
    fn from(connection_id: u32) -> Self {
        Self(connection_id)
    }
}

impl From<ConnectionId> for u32 {
    fn from(connection_id: ConnectionId) -> u32 {
        connection_id.0
    }
}

/// Control protocols carry connection ids as hex text.
impl std::str::FromStr for ConnectionId {
    type Err = InvalidConnectionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u32::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| InvalidConnectionIdError(s.to_string()))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", self.0)
    }
}
