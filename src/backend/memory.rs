//! Memory Backend
//!
//! Bounded in-process backend: a `CacheStore` behind a single mutex.

use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::backend::CacheBackend;
use crate::cache::{CacheStore, CacheValue, Ttl};
use crate::error::Result;

/// Thread-safe, bounded, in-process backend with TTL and
/// least-recently-accessed eviction.
///
/// The entry map and the access map are only ever touched while holding
/// the store lock.
#[derive(Debug)]
pub struct MemoryBackend {
    store: Mutex<CacheStore>,
}

impl MemoryBackend {
    /// # Arguments
    /// * `max_size` - Maximum number of entries
    /// * `default_ttl` - Lifetime for writes that ask for `Ttl::Default`
    pub fn new(max_size: usize, default_ttl: Duration) -> Self {
        Self {
            store: Mutex::new(CacheStore::new(max_size, default_ttl)),
        }
    }

    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.store.lock().max_entries()
    }

    pub fn evictions(&self) -> u64 {
        self.store.lock().evictions()
    }

    pub fn expirations(&self) -> u64 {
        self.store.lock().expirations()
    }
}

impl CacheBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<CacheValue> {
        self.store.lock().get(key)
    }

    fn set(&self, key: &str, value: CacheValue, ttl: Ttl) -> Result<()> {
        let evicted = self.store.lock().set(key.to_string(), value, ttl)?;
        if let Some(evicted) = evicted {
            debug!("Evicted least recently accessed key: {}", evicted);
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> bool {
        self.store.lock().delete(key)
    }

    fn clear(&self) {
        self.store.lock().clear();
    }

    fn exists(&self, key: &str) -> bool {
        self.store.lock().exists(key)
    }

    fn name(&self) -> &'static str {
        "memory"
    }

    fn size(&self) -> Option<usize> {
        Some(self.len())
    }

    fn cleanup_expired(&self) -> usize {
        self.store.lock().cleanup_expired()
    }
}
