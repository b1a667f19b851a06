//! Cache Statistics Module
//!
//! Request, hit and miss counters kept by the cache manager.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time view of the manager's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub total_requests: u64,
    pub hits: u64,
    pub misses: u64,
    /// hits / total_requests, 0.0 before the first request
    pub hit_rate: f64,
}

impl CacheStats {
    pub fn new(total_requests: u64, hits: u64, misses: u64) -> Self {
        let hit_rate = if total_requests == 0 {
            0.0
        } else {
            hits as f64 / total_requests as f64
        };
        Self {
            total_requests,
            hits,
            misses,
            hit_rate,
        }
    }
}

// == Stats Counters ==
/// Lock-free counters, monotonically non-decreasing for the manager's lifetime.
#[derive(Debug, Default)]
pub struct StatsCounters {
    total_requests: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl StatsCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStats {
        CacheStats::new(
            self.total_requests.load(Ordering::Relaxed),
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}
