//! Surface Cache - memoization layer for expensive surface computations
//!
//! Wraps pure, parametrized computations with get-or-compute-and-store
//! semantics over a bounded in-memory store or a remote Redis store.

pub mod backend;
pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod manager;
pub mod registry;
pub mod tasks;

pub use backend::{CacheBackend, MemoryBackend, RemoteBackend};
pub use cache::{CacheStats, Ttl};
pub use codec::{generate_key, key_for, CacheKey, CallArgs, NumericArray};
pub use config::{BackendKind, CacheConfig};
pub use error::{CacheError, Result};
pub use manager::{create_cache_manager, CacheManager, Memoized};
pub use registry::ComputationKind;
pub use tasks::spawn_cleanup_task;
