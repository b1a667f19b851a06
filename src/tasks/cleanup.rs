//! Expired Entry Sweeper
//!
//! Background task that periodically drops expired entries from the
//! manager's backend.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::manager::CacheManager;

/// Spawns a task that calls [`CacheManager::cleanup_expired`] every
/// `interval` until aborted.
///
/// Backends with native expiry report nothing to remove, so the task is
/// harmless but useless with a remote backend.
///
/// # Example
/// ```ignore
/// let manager = registry::initialize(&config)?;
/// let sweeper = spawn_cleanup_task(manager, Duration::from_secs(60));
/// // Later, during shutdown:
/// sweeper.abort();
/// ```
pub fn spawn_cleanup_task(manager: Arc<CacheManager>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting cache cleanup task for {} backend every {:?}",
            manager.backend_name(),
            interval
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = manager.cleanup_expired();
            if removed > 0 {
                info!("Cache cleanup: removed {} expired entries", removed);
            } else {
                debug!("Cache cleanup: no expired entries found");
            }
        }
    })
}
