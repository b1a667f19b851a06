//! Memoized computations
//!
//! A [`Memoized`] borrows its manager and wraps one pure function. Caching
//! is best-effort: nothing that goes wrong inside the cache path changes
//! what the caller gets back.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::{decode_value, encode_value, CacheManager};
use crate::cache::Ttl;
use crate::codec::{self, CacheKey};

/// Outcome of the cache lookup for one call.
enum Lookup<T> {
    Hit(T),
    Miss(CacheKey),
    /// The arguments have no canonical key; compute without storing.
    Uncacheable,
}

/// A function wrapped with get-or-compute-and-store semantics.
///
/// Created by [`CacheManager::memoize`]. The wrapped function takes its
/// arguments as a single `Serialize` value, typically a tuple or a struct,
/// which is also what the key is derived from.
pub struct Memoized<'a, F> {
    manager: &'a CacheManager,
    prefix: String,
    ttl: Ttl,
    use_cache: bool,
    func: F,
}

impl<'a, F> Memoized<'a, F> {
    pub(super) fn new(
        manager: &'a CacheManager,
        prefix: String,
        ttl: Ttl,
        use_cache: bool,
        func: F,
    ) -> Self {
        Self {
            manager,
            prefix,
            ttl,
            use_cache,
            func,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    pub fn uses_cache(&self) -> bool {
        self.use_cache
    }

    /// Calls an infallible computation, serving the result from the cache
    /// when possible.
    pub fn call<A, T>(&self, args: &A) -> T
    where
        A: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        F: Fn(&A) -> T,
    {
        if !self.use_cache {
            return (self.func)(args);
        }

        match self.lookup(args) {
            Lookup::Hit(value) => value,
            Lookup::Miss(key) => {
                let value = (self.func)(args);
                self.store(&key, &value);
                value
            }
            Lookup::Uncacheable => (self.func)(args),
        }
    }

    /// Calls a fallible computation.
    ///
    /// An error from the computation is returned unchanged and nothing is
    /// stored for that call.
    pub fn try_call<A, T, E>(&self, args: &A) -> Result<T, E>
    where
        A: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        F: Fn(&A) -> Result<T, E>,
    {
        if !self.use_cache {
            return (self.func)(args);
        }

        match self.lookup(args) {
            Lookup::Hit(value) => Ok(value),
            Lookup::Miss(key) => {
                let value = (self.func)(args)?;
                self.store(&key, &value);
                Ok(value)
            }
            Lookup::Uncacheable => (self.func)(args),
        }
    }

    fn lookup<A, T>(&self, args: &A) -> Lookup<T>
    where
        A: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let counters = self.manager.counters();
        counters.record_request();

        let key = match codec::key_for(&self.prefix, args) {
            Ok(key) => key,
            Err(e) => {
                warn!("Not caching {} call: {}", self.prefix, e);
                counters.record_miss();
                return Lookup::Uncacheable;
            }
        };

        let backend = self.manager.backend();
        if let Some(bytes) = backend.get(key.as_str()) {
            match decode_value::<T>(&bytes) {
                Ok(value) => {
                    counters.record_hit();
                    debug!("Cache hit for key: {}", key);
                    return Lookup::Hit(value);
                }
                Err(e) => {
                    warn!("Discarding unreadable cache entry {}: {}", key, e);
                    backend.delete(key.as_str());
                }
            }
        }

        counters.record_miss();
        debug!("Cache miss for key: {}", key);
        Lookup::Miss(key)
    }

    fn store<T: Serialize>(&self, key: &CacheKey, value: &T) {
        let bytes = match encode_value(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to serialize result for key {}: {}", key, e);
                return;
            }
        };

        match self.manager.backend().set(key.as_str(), bytes, self.ttl) {
            Ok(()) => debug!("Cached result for key: {}", key),
            Err(e) => warn!("Failed to cache result for key {}: {}", key, e),
        }
    }
}

impl<F> fmt::Debug for Memoized<'_, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("prefix", &self.prefix)
            .field("ttl", &self.ttl)
            .field("use_cache", &self.use_cache)
            .field("backend", &self.manager.backend_name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{CacheBackend, MemoryBackend};
    use crate::cache::CacheValue;
    use crate::codec::NumericArray;
    use crate::error::{CacheError, Result};
    use serde::Deserialize;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn memory_manager() -> CacheManager {
        CacheManager::new(MemoryBackend::new(100, Duration::from_secs(3600)))
    }

    #[derive(Debug, Serialize)]
    struct SurfaceParams {
        u_res: u32,
        v_res: u32,
        scale: f64,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Invariants {
        euler_characteristic: i32,
        orientable: bool,
        genus: u32,
    }

    #[test]
    fn test_counting_function_runs_once() {
        let manager = memory_manager();
        let counter = AtomicUsize::new(0);
        let counted = manager.memoize("klein_bottle", Ttl::Default, true, |_: &(u32, u32)| {
            counter.fetch_add(1, Ordering::SeqCst) + 1
        });

        let results: Vec<usize> = (0..5).map(|_| counted.call(&(50, 50))).collect();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|&r| r == 1));
    }

    #[test]
    fn test_stats_after_mixed_calls() {
        let manager = memory_manager();
        let cube = manager.memoize("topology", Ttl::Default, true, |x: &i32| x * x * x);

        for x in [1, 2, 1, 3, 2, 1] {
            cube.call(&x);
        }

        let stats = manager.stats();
        assert_eq!(stats.total_requests, 6);
        assert_eq!(stats.misses, 3);
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.hits + stats.misses, stats.total_requests);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_use_cache_false_bypasses_everything() {
        let manager = memory_manager();
        let counter = AtomicUsize::new(0);
        let forced = manager.memoize("torus", Ttl::Default, false, |_: &u8| {
            counter.fetch_add(1, Ordering::SeqCst)
        });

        assert!(!forced.uses_cache());
        forced.call(&1);
        forced.call(&1);

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(manager.stats().total_requests, 0);
        assert_eq!(manager.backend().size(), Some(0));
    }

    #[test]
    fn test_struct_arguments_and_results() {
        let manager = memory_manager();
        let counter = AtomicUsize::new(0);
        let invariants = manager.memoize("topology", Ttl::Default, true, |p: &SurfaceParams| {
            counter.fetch_add(1, Ordering::SeqCst);
            Invariants {
                euler_characteristic: 0,
                orientable: false,
                genus: p.u_res / p.v_res,
            }
        });

        let params = SurfaceParams {
            u_res: 100,
            v_res: 50,
            scale: 1.5,
        };
        let first = invariants.call(&params);
        let second = invariants.call(&params);

        assert_eq!(first, second);
        assert_eq!(first.genus, 2);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_numeric_array_argument() {
        let manager = memory_manager();
        let counter = AtomicUsize::new(0);
        let total = manager.memoize("mobius_strip", Ttl::Default, true, |a: &NumericArray| {
            counter.fetch_add(1, Ordering::SeqCst);
            a.data().iter().sum::<f64>()
        });

        let grid = NumericArray::new(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let same_grid = NumericArray::new(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();

        assert_eq!(total.call(&grid), 10.0);
        assert_eq!(total.call(&same_grid), 10.0);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_error_propagates_and_is_not_stored() {
        let manager = memory_manager();
        let counter = AtomicUsize::new(0);
        let checked = manager.memoize("torus", Ttl::Default, true, |r: &f64| {
            counter.fetch_add(1, Ordering::SeqCst);
            if *r <= 0.0 {
                Err(format!("radius must be positive, got {}", r))
            } else {
                Ok(r * 2.0)
            }
        });

        assert!(checked.try_call(&-1.0).is_err());
        assert!(checked.try_call(&-1.0).is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(manager.backend().size(), Some(0));

        assert_eq!(checked.try_call(&2.0), Ok(4.0));
        assert_eq!(checked.try_call(&2.0), Ok(4.0));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_unencodable_arguments_are_computed_uncached() {
        let manager = memory_manager();
        let counter = AtomicUsize::new(0);
        let by_point = manager.memoize("topology", Ttl::Default, true, |m: &HashMap<(i32, i32), u8>| {
            counter.fetch_add(1, Ordering::SeqCst);
            m.len()
        });

        let mut points = HashMap::new();
        points.insert((0, 0), 1u8);

        assert_eq!(by_point.call(&points), 1);
        assert_eq!(by_point.call(&points), 1);

        let stats = manager.stats();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.misses, 2);
        assert_eq!(manager.backend().size(), Some(0));
    }

    #[test]
    fn test_corrupt_entry_is_recomputed() {
        let manager = memory_manager();
        let key = codec::key_for("torus", &7u64).unwrap();
        manager
            .backend()
            .set(key.as_str(), Vec::new(), Ttl::Default)
            .unwrap();

        let square = manager.memoize("torus", Ttl::Default, true, |x: &u64| x * x);
        assert_eq!(square.call(&7), 49);
        assert_eq!(square.call(&7), 49);

        let stats = manager.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn test_expired_result_is_recomputed() {
        let manager = memory_manager();
        let counter = AtomicUsize::new(0);
        let short_lived = manager.memoize("klein_bottle", Ttl::millis(10), true, |_: &()| {
            counter.fetch_add(1, Ordering::SeqCst)
        });

        short_lived.call(&());
        thread::sleep(Duration::from_millis(20));
        short_lived.call(&());

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(manager.stats().hits, 0);
    }

    #[test]
    fn test_none_and_empty_some_are_separate_calls() {
        let manager = memory_manager();
        let counter = AtomicUsize::new(0);
        let has_samples = manager.memoize("torus", Ttl::Default, true, |a: &Option<Vec<f64>>| {
            counter.fetch_add(1, Ordering::SeqCst);
            a.is_some()
        });
        assert!(has_samples.uses_cache());
        assert_eq!(has_samples.prefix(), "torus");
        assert_eq!(has_samples.ttl(), Ttl::Default);

        assert!(!has_samples.call(&None));
        assert!(has_samples.call(&Some(Vec::new())));
        assert!(!has_samples.call(&None));

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(manager.stats().hits, 1);
    }

    #[test]
    fn test_nested_none_is_a_separate_call() {
        let manager = memory_manager();
        let depth = manager.memoize("topology", Ttl::Default, true, |a: &Option<Option<u8>>| {
            match a {
                None => 0u8,
                Some(None) => 1,
                Some(Some(_)) => 2,
            }
        });

        assert_eq!(depth.call(&None), 0);
        assert_eq!(depth.call(&Some(None)), 1);
        assert_eq!(depth.call(&Some(Some(4))), 2);
        assert_eq!(manager.stats().misses, 3);
    }

    #[test]
    fn test_prefixes_do_not_collide() {
        let manager = memory_manager();
        let torus = manager.memoize("torus", Ttl::Default, true, |x: &u32| x + 1);
        let mobius = manager.memoize("mobius_strip", Ttl::Default, true, |x: &u32| x + 100);

        assert_eq!(torus.call(&1), 2);
        assert_eq!(mobius.call(&1), 101);
        assert_eq!(manager.stats().misses, 2);
    }

    /// Backend whose writes always fail.
    #[derive(Debug)]
    struct BrokenWrites;

    impl CacheBackend for BrokenWrites {
        fn get(&self, _key: &str) -> Option<CacheValue> {
            None
        }
        fn set(&self, _key: &str, _value: CacheValue, _ttl: Ttl) -> Result<()> {
            Err(CacheError::Backend("disk on fire".to_string()))
        }
        fn delete(&self, _key: &str) -> bool {
            false
        }
        fn clear(&self) {}
        fn exists(&self, _key: &str) -> bool {
            false
        }
        fn name(&self) -> &'static str {
            "broken"
        }
    }

    #[test]
    fn test_store_failure_still_returns_result() {
        let manager = CacheManager::new(BrokenWrites);
        let negate = manager.memoize("topology", Ttl::Default, true, |x: &i32| -x);

        assert_eq!(negate.call(&3), -3);
        assert_eq!(negate.call(&3), -3);
        assert_eq!(manager.stats().misses, 2);
    }

    #[test]
    fn test_concurrent_callers_share_results() {
        let manager = Arc::new(memory_manager());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let manager = Arc::clone(&manager);
                thread::spawn(move || {
                    let square = manager.memoize("torus", Ttl::Default, true, |x: &u64| x * x);
                    for i in 0..50u64 {
                        assert_eq!(square.call(&(i % 10)), (i % 10) * (i % 10));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let stats = manager.stats();
        assert_eq!(stats.total_requests, 200);
        assert_eq!(stats.hits + stats.misses, 200);
        assert!(stats.misses >= 10);
    }
}
