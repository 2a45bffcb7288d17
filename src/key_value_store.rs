//! In-memory storage for scalar and hash values.
//!
//! Scalars and hashes live in two independent maps, each behind its own
//! reader-writer lock, so a scalar write never waits on a hash read and vice
//! versa. Expiry is lazy: an entry whose deadline has passed is treated as
//! absent by every operation and physically removed by the next write-locked
//! access that touches it.

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use tokio::time::Instant;

/// A stored scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub value: String,
    pub expires_at: Option<Instant>,
}

impl Entry {
    pub fn new(value: String, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

pub type HashFields = HashMap<String, String>;

#[derive(Debug, Default)]
pub struct Store {
    scalars: RwLock<HashMap<String, Entry>>,
    hashes: RwLock<HashMap<String, HashFields>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous value and TTL.
    pub fn set(&self, key: String, value: String, ttl: Option<Duration>) {
        self.set_and_then(key, value, ttl, || ());
    }

    /// Like [`Store::set`], running `on_commit` before the write lock is
    /// released. Anything `on_commit` does is therefore ordered exactly like
    /// the writes themselves.
    pub fn set_and_then<F, T>(
        &self,
        key: String,
        value: String,
        ttl: Option<Duration>,
        on_commit: F,
    ) -> T
    where
        F: FnOnce() -> T,
    {
        let mut scalars = write(&self.scalars);
        scalars.insert(key, Entry::new(value, ttl));

        on_commit()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();

        {
            let scalars = read(&self.scalars);
            match scalars.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        // Expired: evict, unless a newer write replaced it in between.
        let mut scalars = write(&self.scalars);
        if scalars.get(key).is_some_and(|entry| entry.is_expired(now)) {
            scalars.remove(key);
        }

        None
    }

    /// Returns the stored entry, expired or not. Mostly useful for inspection.
    pub fn entry(&self, key: &str) -> Option<Entry> {
        read(&self.scalars).get(key).cloned()
    }

    /// Removes `key`. Returns whether a live entry was removed.
    pub fn delete(&self, key: &str) -> bool {
        self.delete_and_then(&[key], |_| ()).0 == 1
    }

    /// Removes every key in `keys` and runs `on_commit` with the number of
    /// live entries removed, under the same write lock.
    pub fn delete_and_then<K, F, T>(&self, keys: &[K], on_commit: F) -> (usize, T)
    where
        K: AsRef<str>,
        F: FnOnce(usize) -> T,
    {
        let now = Instant::now();
        let mut scalars = write(&self.scalars);

        let removed = keys
            .iter()
            .filter_map(|key| scalars.remove(key.as_ref()))
            .filter(|entry| !entry.is_expired(now))
            .count();

        let outcome = on_commit(removed);
        (removed, outcome)
    }

    pub fn hset(&self, key: String, field: String, value: String) {
        self.hset_and_then(key, field, value, || ());
    }

    /// Like [`Store::hset`], running `on_commit` under the hash write lock.
    pub fn hset_and_then<F, T>(
        &self,
        key: String,
        field: String,
        value: String,
        on_commit: F,
    ) -> T
    where
        F: FnOnce() -> T,
    {
        let mut hashes = write(&self.hashes);
        hashes.entry(key).or_default().insert(field, value);

        on_commit()
    }

    pub fn hget(&self, key: &str, field: &str) -> Option<String> {
        read(&self.hashes)
            .get(key)
            .and_then(|fields| fields.get(field))
            .cloned()
    }

    /// All fields of the hash at `key`, or `None` if no hash record exists.
    pub fn hgetall(&self, key: &str) -> Option<HashFields> {
        read(&self.hashes).get(key).cloned()
    }

    /// Number of live scalar keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        read(&self.scalars)
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Poisoning is ignored: every mutation is a single map operation.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
