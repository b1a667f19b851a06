//! Cache Module
//!
//! Building blocks shared by the backends and the manager: entries with TTL,
//! access tracking for eviction, the single-threaded store and statistics.

mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::{CacheEntry, Ttl};
pub use lru::AccessTracker;
pub use stats::{CacheStats, StatsCounters};
pub use store::CacheStore;

/// Serialized value as held by every backend.
pub type CacheValue = Vec<u8>;
