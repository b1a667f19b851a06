//! Access Tracker Module
//!
//! Records the last access of every key for least-recently-accessed eviction.

use std::collections::{BTreeMap, HashMap};

// == Access Tracker ==
/// Maps each key to a logical last-access timestamp.
///
/// The timestamp is a monotonically increasing tick rather than wall-clock
/// time, so two accesses never tie and eviction order is deterministic.
/// `by_tick` is the reverse index used to find the oldest key in O(log n).
#[derive(Debug, Default)]
pub struct AccessTracker {
    clock: u64,
    last_access: HashMap<String, u64>,
    by_tick: BTreeMap<u64, String>,
}

impl AccessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Stamps `key` with the next tick, inserting it if unknown.
    pub fn touch(&mut self, key: &str) {
        self.clock += 1;
        if let Some(previous) = self.last_access.insert(key.to_string(), self.clock) {
            self.by_tick.remove(&previous);
        }
        self.by_tick.insert(self.clock, key.to_string());
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) -> bool {
        match self.last_access.remove(key) {
            Some(tick) => {
                self.by_tick.remove(&tick);
                true
            }
            None => false,
        }
    }

    // == Evict Oldest ==
    /// Removes and returns the key with the smallest last-access tick.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.by_tick.pop_first()?;
        self.last_access.remove(&key);
        Some(key)
    }

    pub fn peek_oldest(&self) -> Option<&str> {
        self.by_tick.first_key_value().map(|(_, key)| key.as_str())
    }

    pub fn last_access(&self, key: &str) -> Option<u64> {
        self.last_access.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.last_access.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_access.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.last_access.contains_key(key)
    }

    /// Forgets every key. The clock keeps running.
    pub fn clear(&mut self) {
        self.last_access.clear();
        self.by_tick.clear();
    }
}
