//
// Copyright 2021 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Weak,
    },
};

use log::*;
use media_common::{CallId, ConcurrentMap, ConnectionId};
use thiserror::Error;

use crate::{call_manager::CallManager, connection::Connection};

#[derive(Error, Debug, Eq, PartialEq)]
pub enum Error {
    #[error("call-{0} has already terminated")]
    Terminated(CallId),
}

/// A group of connections sharing media.
///
/// A call terminates the moment its last connection is removed, and tells its
/// manager about it exactly once. Every method can be called concurrently.
pub struct Call {
    id: CallId,
    connections: ConcurrentMap<ConnectionId, Arc<Connection>>,
    manager: Weak<CallManager>,
    terminated: AtomicBool,
}

impl Call {
    pub(crate) fn new(id: CallId, manager: Weak<CallManager>, registry_shards: usize) -> Self {
        Self {
            id,
            connections: ConcurrentMap::with_shard_count(registry_shards),
            manager,
            terminated: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> CallId {
        self.id
    }

    /// The number of live connections.
    pub fn size(&self) -> usize {
        self.connections.len()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    pub fn get_connection(&self, connection_id: ConnectionId) -> Option<Arc<Connection>> {
        self.connections.get(&connection_id)
    }

    /// Adds or replaces a connection, returning the one it replaced.
    pub fn add_connection(
        &self,
        connection: Arc<Connection>,
    ) -> Result<Option<Arc<Connection>>, Error> {
        if self.is_terminated() {
            return Err(Error::Terminated(self.id));
        }
        let connection_id = connection.id();
        let previous = self.connections.put(connection_id, connection);
        if self.is_terminated() {
            // Lost a race with termination, don't leave the connection behind.
            self.connections.remove(&connection_id);
            return Err(Error::Terminated(self.id));
        }
        trace!("{}: added connection {}", self, connection_id);
        Ok(previous)
    }

    /// Removes a connection without notifying its endpoint, typically because
    /// the endpoint itself is giving it up. Unknown connections are ignored.
    pub fn exclude(&self, connection: &Connection) {
        let removal = self.connections.remove_reporting_empty(&connection.id());
        if removal.value.is_some() {
            trace!("{}: excluded connection {}", self, connection.id());
        }
        if removal.emptied {
            self.terminate();
        }
    }

    /// Removes every connection, telling each owning endpoint about it, and
    /// then terminates the call.
    pub fn delete_connections(&self) {
        debug!("{}: deleting {} connections", self, self.size());
        for connection_id in self.connections.keys() {
            if let Some(connection) = self.connections.remove(&connection_id) {
                connection.notify_endpoint();
            }
        }
        if self.connections.is_empty() {
            self.terminate();
        }
    }

    fn terminate(&self) {
        if self.terminated.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("{}: terminated", self);
        // An add that raced with the last removal may have slipped in
        // before the flag was set.
        for connection_id in self.connections.keys() {
            if let Some(connection) = self.connections.remove(&connection_id) {
                debug!("{}: dropping late connection {}", self, connection_id);
                connection.notify_endpoint();
            }
        }
        match self.manager.upgrade() {
            Some(manager) => manager.terminate(self),
            None => warn!("{}: terminated after its manager was dropped", self),
        }
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "call-{}", self.id)
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("id", &self.id)
            .field("size", &self.size())
            .field("terminated", &self.is_terminated())
            .finish()
    }
}
