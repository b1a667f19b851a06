//! Cache Manager Module
//!
//! Owns one backend and the hit/miss counters, and hands out memoizing
//! wrappers around pure computations.

mod memoize;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::backend::{CacheBackend, MemoryBackend, RemoteBackend};
use crate::cache::{CacheStats, CacheValue, StatsCounters, Ttl};
use crate::codec;
use crate::config::{BackendKind, CacheConfig};
use crate::error::{CacheError, Result};

pub use memoize::Memoized;

// == Cache Manager ==
/// Memoization front-end over a single [`CacheBackend`].
///
/// The manager exclusively owns its backend. Counters only ever grow for the
/// lifetime of the manager.
#[derive(Debug)]
pub struct CacheManager {
    backend: Box<dyn CacheBackend>,
    stats: StatsCounters,
}

impl CacheManager {
    pub fn new(backend: impl CacheBackend + 'static) -> Self {
        Self::from_boxed(Box::new(backend))
    }

    pub fn from_boxed(backend: Box<dyn CacheBackend>) -> Self {
        Self {
            backend,
            stats: StatsCounters::new(),
        }
    }

    pub fn backend(&self) -> &dyn CacheBackend {
        self.backend.as_ref()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Wraps `func` with get-or-compute-and-store semantics.
    ///
    /// # Arguments
    /// * `prefix` - Key prefix naming the computation
    /// * `ttl` - Lifetime of stored results
    /// * `use_cache` - `false` calls `func` directly, skipping keys and counters
    /// * `func` - Pure function of its argument
    ///
    /// # Example
    /// ```ignore
    /// let area = manager.memoize("torus", Ttl::Default, true, |&(r, a): &(f64, f64)| {
    ///     4.0 * std::f64::consts::PI.powi(2) * r * a
    /// });
    /// let value = area.call(&(3.0, 1.0));
    /// ```
    pub fn memoize<F>(
        &self,
        prefix: impl Into<String>,
        ttl: Ttl,
        use_cache: bool,
        func: F,
    ) -> Memoized<'_, F> {
        Memoized::new(self, prefix.into(), ttl, use_cache, func)
    }

    /// Snapshot of the counters. No side effects.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Removes every stored result. Counters are kept.
    pub fn clear_all(&self) {
        self.backend.clear();
        info!("Cleared all entries from {} cache", self.backend.name());
    }

    /// Drops expired entries from backends that hold them in-process.
    pub fn cleanup_expired(&self) -> usize {
        self.backend.cleanup_expired()
    }

    /// Removes the stored result of one call, returning whether it was present.
    pub fn invalidate<A: Serialize + ?Sized>(&self, prefix: &str, args: &A) -> bool {
        match codec::key_for(prefix, args) {
            Ok(key) => self.backend.delete(key.as_str()),
            Err(e) => {
                warn!("Cannot invalidate {} call: {}", prefix, e);
                false
            }
        }
    }

    pub(crate) fn counters(&self) -> &StatsCounters {
        &self.stats
    }
}

// == Value Serialization ==
pub(crate) fn encode_value<T: Serialize + ?Sized>(value: &T) -> Result<CacheValue> {
    bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| CacheError::Serialization(e.to_string()))
}

pub(crate) fn decode_value<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (value, read) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
        .map_err(|e| CacheError::Serialization(e.to_string()))?;
    if read != bytes.len() {
        return Err(CacheError::Serialization(format!(
            "{} trailing bytes after stored value",
            bytes.len() - read
        )));
    }
    Ok(value)
}

// == Factory ==
/// Builds a manager for `config`.
///
/// A remote backend that cannot be reached is replaced by a memory backend
/// with the same TTL and capacity; only an invalid configuration is an error.
pub fn create_cache_manager(config: &CacheConfig) -> Result<CacheManager> {
    config.validate()?;

    if config.backend == BackendKind::Remote && config.remote_url.is_none() {
        warn!("Remote cache backend selected without a URL, using memory backend");
    }

    if let (BackendKind::Remote, Some(url)) = (config.effective_backend(), &config.remote_url) {
        match RemoteBackend::connect(url, config.default_ttl_duration(), config.remote_timeout()) {
            Ok(backend) => return Ok(CacheManager::new(backend)),
            Err(e) => warn!("Failed to create remote cache, falling back to memory: {}", e),
        }
    }

    info!(
        "Using memory cache backend: max_size={}, default_ttl={}s",
        config.max_size, config.default_ttl
    );
    Ok(CacheManager::new(MemoryBackend::new(
        config.max_size,
        config.default_ttl_duration(),
    )))
}
