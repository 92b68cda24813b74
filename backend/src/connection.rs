//
// Copyright 2021 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

use std::{
    fmt,
    sync::{Arc, Weak},
};

use log::*;
use media_common::ConnectionId;

/// The owner of connections, notified when one of them is deleted on its
/// behalf by a [`crate::call::Call`].
pub trait Endpoint: Send + Sync {
    fn name(&self) -> &str;

    fn delete_connection(&self, connection_id: ConnectionId);
}

/// A media connection that belongs to one call. The connection does not keep
/// its endpoint alive.
pub struct Connection {
    id: ConnectionId,
    endpoint: Weak<dyn Endpoint>,
}

impl Connection {
    pub fn new<E: Endpoint + 'static>(id: ConnectionId, endpoint: &Arc<E>) -> Self {
        let endpoint: Weak<E> = Arc::downgrade(endpoint);
        Self { id, endpoint }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Tells the owning endpoint that this connection was deleted. Returns
    /// false if the endpoint no longer exists.
    pub fn notify_endpoint(&self) -> bool {
        match self.endpoint.upgrade() {
            Some(endpoint) => {
                debug!("deleting connection {} from {}", self.id, endpoint.name());
                endpoint.delete_connection(self.id);
                true
            }
            None => {
                warn!("connection {} outlived its endpoint", self.id);
                false
            }
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("endpoint_alive", &(self.endpoint.strong_count() > 0))
            .finish()
    }
}
