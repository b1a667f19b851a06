//! Process-wide cache registry
//!
//! Holds at most one active [`CacheManager`] for call sites that do not get
//! one injected. Nothing is built implicitly: until [`initialize`] or
//! [`install`] runs, [`manager`] fails with `NotInitialized` and the
//! `cached*` helpers execute their computation uncached.

use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::{CacheStats, Ttl};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::manager::{create_cache_manager, CacheManager};

static REGISTRY: OnceLock<RwLock<Option<Arc<CacheManager>>>> = OnceLock::new();

fn slot() -> &'static RwLock<Option<Arc<CacheManager>>> {
    REGISTRY.get_or_init(|| RwLock::new(None))
}

// == Lifecycle ==
/// Builds a manager from `config` and makes it the active one, replacing
/// any previous manager.
pub fn initialize(config: &CacheConfig) -> Result<Arc<CacheManager>> {
    let manager = create_cache_manager(config)?;
    let manager = install(manager);
    info!(
        "Cache registry initialized with {} backend",
        manager.backend_name()
    );
    Ok(manager)
}

/// Makes an already-built manager the active one.
pub fn install(manager: CacheManager) -> Arc<CacheManager> {
    let manager = Arc::new(manager);
    *slot().write() = Some(Arc::clone(&manager));
    manager
}

/// The active manager.
pub fn manager() -> Result<Arc<CacheManager>> {
    slot().read().clone().ok_or(CacheError::NotInitialized)
}

pub fn is_initialized() -> bool {
    slot().read().is_some()
}

/// Drops the active manager, returning it if there was one.
pub fn reset() -> Option<Arc<CacheManager>> {
    slot().write().take()
}

/// Clears the active manager's backend. Returns false when uninitialized.
pub fn clear_cache() -> bool {
    match manager() {
        Ok(manager) => {
            manager.clear_all();
            true
        }
        Err(_) => false,
    }
}

pub fn cache_stats() -> Option<CacheStats> {
    manager().ok().map(|manager| manager.stats())
}

// == Cached Calls ==
/// Runs `func` through the active manager, or directly when none is
/// installed.
pub fn cached<A, T, F>(prefix: &str, ttl: Ttl, args: &A, func: F) -> T
where
    A: Serialize + ?Sized,
    T: Serialize + DeserializeOwned,
    F: Fn(&A) -> T,
{
    match manager() {
        Ok(manager) => manager.memoize(prefix, ttl, true, func).call(args),
        Err(_) => {
            debug!("Cache registry not initialized, running {} uncached", prefix);
            func(args)
        }
    }
}

/// Fallible counterpart of [`cached`]. Errors from `func` are returned
/// unchanged and never stored.
pub fn try_cached<A, T, E, F>(prefix: &str, ttl: Ttl, args: &A, func: F) -> std::result::Result<T, E>
where
    A: Serialize + ?Sized,
    T: Serialize + DeserializeOwned,
    F: Fn(&A) -> std::result::Result<T, E>,
{
    match manager() {
        Ok(manager) => manager.memoize(prefix, ttl, true, func).try_call(args),
        Err(_) => {
            debug!("Cache registry not initialized, running {} uncached", prefix);
            func(args)
        }
    }
}

// == Computation Kinds ==
/// Surface and invariant computations with their own key namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComputationKind {
    KleinBottle,
    MobiusStrip,
    Torus,
    Topology,
}

impl ComputationKind {
    pub const ALL: [ComputationKind; 4] = [
        ComputationKind::KleinBottle,
        ComputationKind::MobiusStrip,
        ComputationKind::Torus,
        ComputationKind::Topology,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            ComputationKind::KleinBottle => "klein_bottle",
            ComputationKind::MobiusStrip => "mobius_strip",
            ComputationKind::Torus => "torus",
            ComputationKind::Topology => "topology",
        }
    }
}

impl fmt::Display for ComputationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// [`cached`] under the namespace of `kind`.
pub fn cached_computation<A, T, F>(kind: ComputationKind, ttl: Ttl, args: &A, func: F) -> T
where
    A: Serialize + ?Sized,
    T: Serialize + DeserializeOwned,
    F: Fn(&A) -> T,
{
    cached(kind.prefix(), ttl, args, func)
}

pub fn cached_klein_bottle<A, T, F>(ttl: Ttl, args: &A, func: F) -> T
where
    A: Serialize + ?Sized,
    T: Serialize + DeserializeOwned,
    F: Fn(&A) -> T,
{
    cached_computation(ComputationKind::KleinBottle, ttl, args, func)
}

pub fn cached_mobius_strip<A, T, F>(ttl: Ttl, args: &A, func: F) -> T
where
    A: Serialize + ?Sized,
    T: Serialize + DeserializeOwned,
    F: Fn(&A) -> T,
{
    cached_computation(ComputationKind::MobiusStrip, ttl, args, func)
}

pub fn cached_torus<A, T, F>(ttl: Ttl, args: &A, func: F) -> T
where
    A: Serialize + ?Sized,
    T: Serialize + DeserializeOwned,
    F: Fn(&A) -> T,
{
    cached_computation(ComputationKind::Torus, ttl, args, func)
}

pub fn cached_topology<A, T, F>(ttl: Ttl, args: &A, func: F) -> T
where
    A: Serialize + ?Sized,
    T: Serialize + DeserializeOwned,
    F: Fn(&A) -> T,
{
    cached_computation(ComputationKind::Topology, ttl, args, func)
}
