//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror.

use std::fmt::Display;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache layer.
///
/// Only `InvalidConfig`, `BackendUnavailable` and `NotInitialized` ever reach
/// callers of a memoized function's setup code. Everything else is raised
/// inside the caching path and is logged then swallowed.
#[derive(Error, Debug)]
pub enum CacheError {
    /// An argument cannot be turned into a canonical key
    #[error("Unencodable argument: {0}")]
    UnencodableArgument(String),

    /// The remote store could not be reached at construction time
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A value could not be serialized or deserialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Transient backend I/O failure
    #[error("Backend error: {0}")]
    Backend(String),

    /// Cache is full and eviction failed
    #[error("Cache full: {0}")]
    CacheFull(String),

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The process-wide registry was used before `initialize`
    #[error("Cache manager not initialized")]
    NotInitialized,
}

// The argument serializer reports unsupported shapes through serde's error hook.
impl serde::ser::Error for CacheError {
    fn custom<T: Display>(msg: T) -> Self {
        CacheError::UnencodableArgument(msg.to_string())
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Backend(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;

    #[test]
    fn test_custom_serde_error_is_unencodable() {
        let err = CacheError::custom("map keys must be strings");
        assert!(matches!(err, CacheError::UnencodableArgument(_)));
        assert!(err.to_string().contains("map keys must be strings"));
    }

    #[test]
    fn test_error_messages() {
        let cases = vec![
            (CacheError::BackendUnavailable("refused".into()), "Backend unavailable: refused"),
            (CacheError::Serialization("eof".into()), "Serialization error: eof"),
            (CacheError::NotInitialized, "Cache manager not initialized"),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }
}
