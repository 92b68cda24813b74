//
// Copyright 2021 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

use std::{
    collections::{hash_map::RandomState, HashMap},
    hash::{BuildHasher, Hash},
    sync::atomic::{AtomicUsize, Ordering},
};

use parking_lot::RwLock;

pub const DEFAULT_SHARD_COUNT: usize = 16;

/// The outcome of [`ConcurrentMap::remove_reporting_empty`].
#[derive(Debug, PartialEq, Eq)]
pub struct Removal<V> {
    pub value: Option<V>,
    /// True only for the removal that took the map from one entry to none.
    pub emptied: bool,
}

/// A map that can be shared between threads without any locking by the caller.
///
/// Entries are spread across shards, each behind its own lock. The total
/// entry count is kept in an atomic that is only modified while the shard
/// lock of the affected key is held, so an insert or remove of a given key
/// and the count change it causes are a single step. That makes it possible
/// for a remover to learn that it was the one that emptied the map, without
/// a racy `is_empty()` call after the fact.
pub struct ConcurrentMap<K, V, S = RandomState> {
    shards: Box<[RwLock<HashMap<K, V>>]>,
    len: AtomicUsize,
    hasher: S,
}

impl<K: Eq + Hash, V: Clone> Default for ConcurrentMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, V: Clone> ConcurrentMap<K, V> {
    pub fn new() -> Self {
        Self::with_shard_count(DEFAULT_SHARD_COUNT)
    }

    /// A shard count of 0 is treated as 1.
    pub fn with_shard_count(shard_count: usize) -> Self {
        Self::with_shard_count_and_hasher(shard_count, RandomState::new())
    }
}

impl<K: Eq + Hash, V: Clone, S: BuildHasher> ConcurrentMap<K, V, S> {
    pub fn with_shard_count_and_hasher(shard_count: usize, hasher: S) -> Self {
        let shards = (0..shard_count.max(1))
            .map(|_| RwLock::new(HashMap::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            shards,
            len: AtomicUsize::new(0),
            hasher,
        }
    }

    fn shard(&self, key: &K) -> &RwLock<HashMap<K, V>> {
        let index = (self.hasher.hash_one(key) as usize) % self.shards.len();
        &self.shards[index]
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.shard(key).read().get(key).cloned()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.shard(key).read().contains_key(key)
    }

    /// Inserts or overwrites, returning the previous value for the key.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        let mut shard = self.shard(&key).write();
        let previous = shard.insert(key, value);
        if previous.is_none() {
            self.len.fetch_add(1, Ordering::SeqCst);
        }
        previous
    }

    /// Inserts only when the key is absent. Returns false if it was already present.
    pub fn put_if_absent(&self, key: K, value: V) -> bool {
        let mut shard = self.shard(&key).write();
        if shard.contains_key(&key) {
            return false;
        }
        shard.insert(key, value);
        self.len.fetch_add(1, Ordering::SeqCst);
        true
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.remove_reporting_empty(key).value
    }

    /// Removes the key and reports whether this removal emptied the map.
    ///
    /// Among any number of concurrent removals, exactly one observes
    /// `emptied == true` each time the map goes from one entry to none.
    pub fn remove_reporting_empty(&self, key: &K) -> Removal<V> {
        let mut shard = self.shard(key).write();
        match shard.remove(key) {
            Some(value) => {
                let previous_len = self.len.fetch_sub(1, Ordering::SeqCst);
                Removal {
                    value: Some(value),
                    emptied: previous_len == 1,
                }
            }
            None => Removal {
                value: None,
                emptied: false,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone, V: Clone, S: BuildHasher> ConcurrentMap<K, V, S> {
    /// Returns a snapshot of the keys present when each shard was visited.
    ///
    /// The iterator owns its keys, so removing entries while walking it (the
    /// usual drain pattern) never invalidates or skips anything.
    pub fn keys(&self) -> impl Iterator<Item = K> {
        let mut keys = Vec::with_capacity(self.len());
        for shard in self.shards.iter() {
            keys.extend(shard.read().keys().cloned());
        }
        keys.into_iter()
    }

    /// Returns a snapshot of the values, see [`Self::keys`].
    pub fn values(&self) -> Vec<V> {
        let mut values = Vec::with_capacity(self.len());
        for shard in self.shards.iter() {
            values.extend(shard.read().values().cloned());
        }
        values
    }
}
