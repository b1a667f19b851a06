//! Cache Store Module
//!
//! Single-threaded storage engine combining a HashMap of entries with access
//! tracking for eviction and lazy TTL expiration. Thread safety is added by
//! `MemoryBackend`, which owns the store behind a mutex.

use std::collections::HashMap;
use std::time::Duration;

use crate::cache::{AccessTracker, CacheEntry, CacheValue, Ttl};
use crate::error::{CacheError, Result};

// == Cache Store ==
#[derive(Debug)]
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
    access: AccessTracker,
    max_entries: usize,
    default_ttl: Duration,
    evictions: u64,
    expirations: u64,
}

impl CacheStore {
    // == Constructor ==
    /// # Arguments
    /// * `max_entries` - Maximum number of entries the store can hold
    /// * `default_ttl` - Lifetime used when a write asks for `Ttl::Default`
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            access: AccessTracker::new(),
            max_entries,
            default_ttl,
            evictions: 0,
            expirations: 0,
        }
    }

    // == Set ==
    /// Stores a value, returning the key evicted to make room, if any.
    ///
    /// Overwriting an existing key replaces its value and restarts its TTL
    /// without evicting anything. Inserting a new key into a full store
    /// first evicts exactly one entry, the least recently accessed.
    pub fn set(&mut self, key: String, value: CacheValue, ttl: Ttl) -> Result<Option<String>> {
        let mut evicted = None;

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            let oldest = self.access.evict_oldest().ok_or_else(|| {
                CacheError::CacheFull("Cache is full and eviction failed".to_string())
            })?;
            self.entries.remove(&oldest);
            self.evictions += 1;
            evicted = Some(oldest);
        }

        let entry = CacheEntry::new(value, ttl.resolve(self.default_ttl));
        self.access.touch(&key);
        self.entries.insert(key, entry);

        Ok(evicted)
    }

    // == Get ==
    /// Returns a copy of the stored value if present and live, refreshing its
    /// access time. Expired entries are removed on discovery.
    pub fn get(&mut self, key: &str) -> Option<CacheValue> {
        if self.reap_if_expired(key) {
            return None;
        }
        let value = self.entries.get(key)?.value.clone();
        self.access.touch(key);
        Some(value)
    }

    // == Exists ==
    /// Liveness check that does not count as an access.
    pub fn exists(&mut self, key: &str) -> bool {
        !self.reap_if_expired(key) && self.entries.contains_key(key)
    }

    // == Delete ==
    pub fn delete(&mut self, key: &str) -> bool {
        self.access.remove(key);
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.access.clear();
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and returns how many were removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_expired(key);
        }
        expired_keys.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Entries removed to satisfy the capacity bound.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Entries removed because their TTL elapsed.
    pub fn expirations(&self) -> u64 {
        self.expirations
    }

    fn reap_if_expired(&mut self, key: &str) -> bool {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired());
        if expired {
            self.remove_expired(key);
        }
        expired
    }

    fn remove_expired(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.access.remove(key);
            self.expirations += 1;
        }
    }
}
