//
// Copyright 2021 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! The process-wide set of live calls.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use anyhow::Result;
use log::*;
use media_common::{CallId, ConcurrentMap};
use parking_lot::Mutex;
use thiserror::Error;

use crate::{call::Call, config::Config};

pub type CallEndHandler = dyn Fn(CallId, &Call) -> Result<()> + Send + Sync + 'static;

#[derive(Error, Debug, Eq, PartialEq)]
pub enum CallManagerError {
    #[error("all call ids have been used")]
    CallIdsExhausted,
    #[error("call-{0} already exists")]
    CallIdInUse(CallId),
}

pub struct CallManager {
    config: &'static Config,
    // Wider than a call id so that u32::MAX itself can be handed out.
    next_call_id: AtomicU64,
    calls: ConcurrentMap<CallId, Arc<Call>>,
    call_end_handler: Mutex<Option<Arc<CallEndHandler>>>,
}

impl CallManager {
    pub fn new(config: &'static Config) -> Self {
        Self {
            config,
            next_call_id: AtomicU64::new(config.first_call_id.into()),
            calls: ConcurrentMap::with_shard_count(config.registry_shards),
            // To enable, call set_call_ended_handler
            call_end_handler: Mutex::new(None),
        }
    }

    pub fn set_call_ended_handler(&self, new_call_end_handler: Box<CallEndHandler>) {
        *self.call_end_handler.lock() = Some(Arc::from(new_call_end_handler));
    }

    fn allocate_call_id(&self) -> Result<CallId, CallManagerError> {
        self.next_call_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |next| {
                (next <= u64::from(u32::MAX)).then_some(next + 1)
            })
            .ok()
            .and_then(|call_id| u32::try_from(call_id).ok())
            .map(CallId::from)
            .ok_or(CallManagerError::CallIdsExhausted)
    }

    /// Creates and registers a call with a fresh id.
    pub fn create_call(self: &Arc<Self>) -> Result<Arc<Call>, CallManagerError> {
        let call_id = self.allocate_call_id().inspect_err(|err| error!("{}", err))?;
        let call = Arc::new(Call::new(
            call_id,
            Arc::downgrade(self),
            self.config.registry_shards,
        ));
        if !self.calls.put_if_absent(call_id, call.clone()) {
            error!("{}: id is already registered", call);
            return Err(CallManagerError::CallIdInUse(call_id));
        }
        info!("{}: created", call);
        Ok(call)
    }

    pub fn get_call(&self, call_id: CallId) -> Option<Arc<Call>> {
        self.calls.get(&call_id)
    }

    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    pub fn call_ids(&self) -> Vec<CallId> {
        self.calls.keys().collect()
    }

    /// Forgets a call. Only the first termination of a call reaches the
    /// call-ended handler, which runs without any lock held so that it may
    /// end other calls itself.
    pub fn terminate(&self, call: &Call) {
        if self.calls.remove(&call.id()).is_none() {
            trace!("{}: already removed", call);
            return;
        }
        info!("{}: ended, {} calls remaining", call, self.call_count());
        let call_end_handler = self.call_end_handler.lock().clone();
        if let Some(call_end_handler) = call_end_handler {
            if let Err(err) = call_end_handler(call.id(), call) {
                warn!("{}: call ended handler failed: {}", call, err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use media_common::ConnectionId;
    use once_cell::sync::Lazy;
    use rand::{seq::SliceRandom, thread_rng};

    use super::*;
    use crate::{
        config,
        connection::{testing::RecordingEndpoint, Connection},
    };

    static DEFAULT_CONFIG: Lazy<config::Config> = Lazy::new(config::default_test_config);

    static LATE_START_CONFIG: Lazy<config::Config> = Lazy::new(|| {
        let mut config = config::default_test_config();
        config.first_call_id = 1000;
        config
    });

    static LAST_ID_CONFIG: Lazy<config::Config> = Lazy::new(|| {
        let mut config = config::default_test_config();
        config.first_call_id = u32::MAX;
        config
    });

    fn new_call_manager(config: &'static config::Config) -> Arc<CallManager> {
        Arc::new(CallManager::new(config))
    }

    fn counting_handler(manager: &CallManager) -> Arc<AtomicUsize> {
        let ended = Arc::new(AtomicUsize::new(0));
        let ended_for_handler = ended.clone();
        manager.set_call_ended_handler(Box::new(move |_call_id, _call| {
            ended_for_handler.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
        ended
    }

    fn add_connections(
        call: &Call,
        endpoint: &Arc<RecordingEndpoint>,
        count: u32,
    ) -> Vec<Arc<Connection>> {
        (0..count)
            .map(|id| {
                let connection = Arc::new(Connection::new(ConnectionId::from(id), endpoint));
                call.add_connection(connection.clone())
                    .expect("call should be live");
                connection
            })
            .collect()
    }

    #[test]
    fn test_create_call() {
        let manager = new_call_manager(&DEFAULT_CONFIG);
        assert_eq!(0, manager.call_count());

        let first = manager.create_call().unwrap();
        let second = manager.create_call().unwrap();
        assert_eq!(CallId::from(1), first.id());
        assert_eq!(CallId::from(2), second.id());
        assert_eq!(2, manager.call_count());

        let found = manager.get_call(first.id()).unwrap();
        assert!(Arc::ptr_eq(&first, &found));
        assert!(manager.get_call(CallId::from(3)).is_none());

        let mut call_ids = manager.call_ids();
        call_ids.sort();
        assert_eq!(vec![CallId::from(1), CallId::from(2)], call_ids);
    }

    #[test]
    fn test_first_call_id() {
        let manager = new_call_manager(&LATE_START_CONFIG);
        assert_eq!("call-1000", manager.create_call().unwrap().to_string());
    }

    #[test]
    fn test_last_exclude_ends_call() {
        let manager = new_call_manager(&DEFAULT_CONFIG);
        let ended = counting_handler(&manager);
        let endpoint = Arc::new(RecordingEndpoint::default());

        let call = manager.create_call().unwrap();
        let other = manager.create_call().unwrap();
        let connections = add_connections(&call, &endpoint, 2);

        call.exclude(&connections[0]);
        assert_eq!(1, call.size());
        assert_eq!(2, manager.call_count());

        call.exclude(&connections[1]);
        assert_eq!(0, call.size());
        assert!(manager.get_call(call.id()).is_none());
        assert!(manager.get_call(other.id()).is_some());
        assert_eq!(1, ended.load(Ordering::SeqCst));

        // Nothing more happens for a call that's already gone.
        call.exclude(&connections[1]);
        call.delete_connections();
        manager.terminate(&call);
        assert_eq!(1, ended.load(Ordering::SeqCst));
        assert_eq!(1, manager.call_count());
    }

    #[test]
    fn test_delete_connections_ends_call() {
        let manager = new_call_manager(&DEFAULT_CONFIG);
        let ended = counting_handler(&manager);
        let endpoint = Arc::new(RecordingEndpoint::default());

        let call = manager.create_call().unwrap();
        add_connections(&call, &endpoint, 5);

        call.delete_connections();
        assert_eq!(5, endpoint.deleted().len());
        assert_eq!(0, manager.call_count());
        assert_eq!(1, ended.load(Ordering::SeqCst));
    }

    #[test]
    fn test_handler_failure_is_tolerated() {
        let manager = new_call_manager(&DEFAULT_CONFIG);
        manager.set_call_ended_handler(Box::new(|call_id, _call| {
            Err(anyhow::anyhow!("no record of {}", call_id))
        }));

        let call = manager.create_call().unwrap();
        call.delete_connections();
        assert!(call.is_terminated());
        assert_eq!(0, manager.call_count());
    }

    #[test]
    fn test_call_ids_exhausted() {
        let manager = new_call_manager(&LAST_ID_CONFIG);
        let last = manager.create_call().unwrap();
        assert_eq!(CallId::from(u32::MAX), last.id());

        // Ids never wrap around to ones handed out before.
        assert_eq!(
            Some(CallManagerError::CallIdsExhausted),
            manager.create_call().err()
        );
        assert_eq!(
            Some(CallManagerError::CallIdsExhausted),
            manager.create_call().err()
        );
        assert_eq!(1, manager.call_count());
        assert!(Arc::ptr_eq(&last, &manager.get_call(last.id()).unwrap()));
    }

    #[test]
    fn test_handler_can_end_other_calls() {
        let manager = new_call_manager(&DEFAULT_CONFIG);
        let endpoint = Arc::new(RecordingEndpoint::default());
        let first = manager.create_call().unwrap();
        let linked = manager.create_call().unwrap();
        add_connections(&first, &endpoint, 1);
        add_connections(&linked, &endpoint, 2);

        let ended = Arc::new(Mutex::new(Vec::new()));
        let ended_for_handler = ended.clone();
        let linked_for_handler = linked.clone();
        let first_id = first.id();
        manager.set_call_ended_handler(Box::new(move |call_id, _call| {
            ended_for_handler.lock().push(call_id);
            if call_id == first_id {
                linked_for_handler.delete_connections();
            }
            Ok(())
        }));

        first.delete_connections();
        assert_eq!(vec![first.id(), linked.id()], *ended.lock());
        assert_eq!(0, manager.call_count());
        assert_eq!(3, endpoint.deleted().len());
        assert!(linked.is_terminated());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_parallel_operations() {
        let manager = new_call_manager(&DEFAULT_CONFIG);
        let ended = counting_handler(&manager);
        let endpoint = Arc::new(RecordingEndpoint::default());

        let count = 50;
        let calls = (0..count)
            .map(|_| {
                let call = manager.create_call().unwrap();
                let connections = add_connections(&call, &endpoint, 8);
                (call, connections)
            })
            .collect::<Vec<_>>();
        assert_eq!(count, manager.call_count());

        let tasks = calls
            .into_iter()
            .flat_map(|(call, mut connections)| {
                connections.shuffle(&mut thread_rng());
                connections.into_iter().map(move |connection| {
                    let call = call.clone();
                    tokio::spawn(async move { call.exclude(&connection) })
                })
            })
            .collect::<Vec<_>>();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(0, manager.call_count());
        assert_eq!(count, ended.load(Ordering::SeqCst));
        assert!(endpoint.deleted().is_empty());
    }
}
