//! Backend Module
//!
//! Storage contract shared by every cache backend plus the two
//! implementations: bounded in-process memory and a remote Redis store.

mod memory;
mod remote;

use std::fmt::Debug;

use crate::cache::{CacheValue, Ttl};
use crate::error::Result;

pub use memory::MemoryBackend;
pub use remote::RemoteBackend;

// == Cache Backend ==
/// Minimal storage contract.
///
/// Implementations must be safe to share between threads. Reads never fail:
/// a value that cannot be produced is reported as absent. Transient remote
/// failures are logged by the backend and surface as a miss or a no-op.
pub trait CacheBackend: Send + Sync + Debug {
    /// Returns the live value stored under `key`.
    fn get(&self, key: &str) -> Option<CacheValue>;

    /// Stores `value` under `key` for the given TTL.
    fn set(&self, key: &str, value: CacheValue, ttl: Ttl) -> Result<()>;

    /// Removes `key`, returning whether it was present.
    fn delete(&self, key: &str) -> bool;

    /// Removes every entry.
    fn clear(&self);

    /// Whether a live value is stored under `key`.
    fn exists(&self, key: &str) -> bool;

    /// Short backend name for logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Number of stored entries, when the backend can report it cheaply.
    fn size(&self) -> Option<usize> {
        None
    }

    /// Eagerly drops expired entries. Backends with native expiry return 0.
    fn cleanup_expired(&self) -> usize {
        0
    }
}
