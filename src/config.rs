//! Configuration Module
//!
//! Handles loading and validating cache configuration from environment
//! variables or a JSON document handed over by the application layer.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Default TTL in seconds for entries stored without an explicit TTL.
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Default capacity of the in-memory backend.
pub const DEFAULT_MAX_SIZE: usize = 1000;

/// Default timeout applied to every remote round-trip.
pub const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 500;

// == Backend Kind ==
/// Storage backend selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Bounded in-process store
    #[default]
    Memory,
    /// External key/value service (Redis protocol)
    #[serde(alias = "redis")]
    Remote,
}

impl FromStr for BackendKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "remote" | "redis" => Ok(BackendKind::Remote),
            other => Err(CacheError::InvalidConfig(format!(
                "unknown backend kind '{}'",
                other
            ))),
        }
    }
}

/// Cache configuration parameters.
///
/// Loaded once at process start and passed to `registry::initialize` or
/// `create_cache_manager`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Which backend to build
    pub backend: BackendKind,
    /// Remote endpoint, e.g. `redis://127.0.0.1:6379`
    pub remote_url: Option<String>,
    /// Default TTL in seconds
    pub default_ttl: u64,
    /// Maximum number of entries held by the memory backend
    pub max_size: usize,
    /// Connect/read/write timeout for the remote backend, in milliseconds
    pub remote_timeout_ms: u64,
    /// Background sweep interval in seconds, 0 disables the sweeper
    pub cleanup_interval: u64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_BACKEND` - `memory` or `remote` (default: memory)
    /// - `CACHE_REMOTE_URL` - Remote endpoint (default: unset)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 3600)
    /// - `CACHE_MAX_SIZE` - Memory backend capacity (default: 1000)
    /// - `CACHE_REMOTE_TIMEOUT_MS` - Remote timeout (default: 500)
    /// - `CACHE_CLEANUP_INTERVAL` - Sweep interval in seconds (default: 0)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            backend: env_parse("CACHE_BACKEND").unwrap_or(defaults.backend),
            remote_url: env::var("CACHE_REMOTE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            default_ttl: env_parse("CACHE_DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            max_size: env_parse("CACHE_MAX_SIZE").unwrap_or(defaults.max_size),
            remote_timeout_ms: env_parse("CACHE_REMOTE_TIMEOUT_MS")
                .unwrap_or(defaults.remote_timeout_ms),
            cleanup_interval: env_parse("CACHE_CLEANUP_INTERVAL")
                .unwrap_or(defaults.cleanup_interval),
        }
    }

    /// Parses a JSON configuration object. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CacheError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations no backend can honor.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(CacheError::InvalidConfig(
                "max_size must be at least 1".to_string(),
            ));
        }
        if self.default_ttl == 0 {
            return Err(CacheError::InvalidConfig(
                "default_ttl must be at least 1 second".to_string(),
            ));
        }
        if self.remote_timeout_ms == 0 {
            return Err(CacheError::InvalidConfig(
                "remote_timeout_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Backend that will actually be built: remote needs both the kind and a URL.
    pub fn effective_backend(&self) -> BackendKind {
        match (self.backend, &self.remote_url) {
            (BackendKind::Remote, Some(_)) => BackendKind::Remote,
            _ => BackendKind::Memory,
        }
    }

    pub fn default_ttl_duration(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            remote_url: None,
            default_ttl: DEFAULT_TTL_SECS,
            max_size: DEFAULT_MAX_SIZE,
            remote_timeout_ms: DEFAULT_REMOTE_TIMEOUT_MS,
            cleanup_interval: 0,
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
