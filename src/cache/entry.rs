//! Cache Entry Module
//!
//! Defines individual cache entries and how their time-to-live is resolved.

use std::time::{Duration, Instant};

use crate::cache::CacheValue;

// == Ttl ==
/// Requested lifetime of a stored value.
///
/// `Default` (and any zero duration) resolves to the backend's default TTL.
/// Only `Never` disables expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ttl {
    #[default]
    Default,
    After(Duration),
    Never,
}

impl Ttl {
    pub fn secs(secs: u64) -> Self {
        Self::from(Duration::from_secs(secs))
    }

    pub fn millis(millis: u64) -> Self {
        Self::from(Duration::from_millis(millis))
    }

    /// Resolves against a backend default. `None` means no expiry.
    pub fn resolve(self, default: Duration) -> Option<Duration> {
        match self {
            Ttl::Default => Some(default),
            Ttl::After(ttl) if ttl.is_zero() => Some(default),
            Ttl::After(ttl) => Some(ttl),
            Ttl::Never => None,
        }
    }
}

impl From<Duration> for Ttl {
    fn from(ttl: Duration) -> Self {
        if ttl.is_zero() {
            Ttl::Default
        } else {
            Ttl::After(ttl)
        }
    }
}

impl From<Option<Duration>> for Ttl {
    fn from(ttl: Option<Duration>) -> Self {
        ttl.map_or(Ttl::Default, Ttl::from)
    }
}

// == Cache Entry ==
/// A stored value with the moment it was written and its resolved TTL.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: CacheValue,
    pub stored_at: Instant,
    /// Resolved lifetime, `None` = no expiration
    pub ttl: Option<Duration>,
}

impl CacheEntry {
    pub fn new(value: CacheValue, ttl: Option<Duration>) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
            ttl,
        }
    }

    // == Is Expired ==
    /// An entry is live while `now < stored_at + ttl`, so it is already
    /// expired at the exact deadline.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }

    /// Remaining lifetime, `Some(ZERO)` once expired, `None` without TTL.
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.ttl.map(|_| {
            self.deadline()
                .map_or(Duration::MAX, |deadline| {
                    deadline.saturating_duration_since(Instant::now())
                })
        })
    }

    /// A TTL too large to represent as an `Instant` never expires.
    fn deadline(&self) -> Option<Instant> {
        self.ttl.and_then(|ttl| self.stored_at.checked_add(ttl))
    }
}
