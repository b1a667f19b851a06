//! Remote Backend
//!
//! Delegates storage to a Redis-protocol key/value service. Expiry is left to
//! the server (`SET .. PX`). The service is an optimization only: after
//! construction every network failure is logged and reported as a miss or a
//! no-op.

use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;
use redis::{Client, Connection, RedisResult};
use tracing::{info, warn};

use crate::backend::CacheBackend;
use crate::cache::{CacheValue, Ttl};
use crate::error::{CacheError, Result};

/// Redis-backed cache.
///
/// Holds one blocking connection. Every round-trip is bounded by `timeout`;
/// a failed round-trip drops the connection and the next operation
/// reconnects.
pub struct RemoteBackend {
    client: Client,
    endpoint: String,
    conn: Mutex<Option<Connection>>,
    default_ttl: Duration,
    timeout: Duration,
}

impl RemoteBackend {
    /// Connects and pings the server.
    ///
    /// Fails fast with `BackendUnavailable` when the endpoint is malformed
    /// or unreachable within `timeout`.
    pub fn connect(endpoint: &str, default_ttl: Duration, timeout: Duration) -> Result<Self> {
        let unavailable =
            |e: &dyn fmt::Display| CacheError::BackendUnavailable(format!("{}: {}", endpoint, e));

        let client = Client::open(endpoint).map_err(|e| unavailable(&e))?;
        let mut conn = open_connection(&client, timeout).map_err(|e| unavailable(&e))?;
        let pong: String = redis::cmd("PING")
            .query(&mut conn)
            .map_err(|e| unavailable(&e))?;

        info!("Connected to remote cache at {} ({})", endpoint, pong);

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            conn: Mutex::new(Some(conn)),
            default_ttl,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Runs one command on the shared connection, reconnecting if the
    /// previous command broke it.
    fn run<T>(
        &self,
        command: &str,
        op: impl FnOnce(&mut Connection) -> RedisResult<T>,
    ) -> Result<T> {
        let mut slot = self.conn.lock();
        if slot.is_none() {
            *slot = Some(open_connection(&self.client, self.timeout)?);
        }
        let Some(conn) = slot.as_mut() else {
            return Err(CacheError::Backend("no remote connection".to_string()));
        };

        match op(conn) {
            Ok(value) => Ok(value),
            Err(e) => {
                *slot = None;
                Err(CacheError::Backend(format!("{} failed: {}", command, e)))
            }
        }
    }
}

fn open_connection(client: &Client, timeout: Duration) -> Result<Connection> {
    let conn = client.get_connection_with_timeout(timeout)?;
    conn.set_read_timeout(Some(timeout))?;
    conn.set_write_timeout(Some(timeout))?;
    Ok(conn)
}

/// Millisecond expiry for `SET .. PX`, at least 1 ms.
fn expiry_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

impl CacheBackend for RemoteBackend {
    fn get(&self, key: &str) -> Option<CacheValue> {
        self.run("GET", |conn| {
            redis::cmd("GET").arg(key).query::<Option<Vec<u8>>>(conn)
        })
        .unwrap_or_else(|e| {
            warn!("Remote cache read for {} treated as miss: {}", key, e);
            None
        })
    }

    fn set(&self, key: &str, value: CacheValue, ttl: Ttl) -> Result<()> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value.as_slice());
        if let Some(ttl) = ttl.resolve(self.default_ttl) {
            cmd.arg("PX").arg(expiry_millis(ttl));
        }

        if let Err(e) = self.run("SET", |conn| cmd.query::<()>(conn)) {
            warn!("Remote cache write for {} skipped: {}", key, e);
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> bool {
        self.run("DEL", |conn| redis::cmd("DEL").arg(key).query::<i64>(conn))
            .map(|removed| removed > 0)
            .unwrap_or_else(|e| {
                warn!("Remote cache delete for {} skipped: {}", key, e);
                false
            })
    }

    fn clear(&self) {
        if let Err(e) = self.run("FLUSHDB", |conn| redis::cmd("FLUSHDB").query::<()>(conn)) {
            warn!("Remote cache clear skipped: {}", e);
        }
    }

    fn exists(&self, key: &str) -> bool {
        self.run("EXISTS", |conn| {
            redis::cmd("EXISTS").arg(key).query::<i64>(conn)
        })
        .map(|count| count > 0)
        .unwrap_or_else(|e| {
            warn!("Remote cache existence check for {} failed: {}", key, e);
            false
        })
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

impl fmt::Debug for RemoteBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteBackend")
            .field("endpoint", &self.endpoint)
            .field("default_ttl", &self.default_ttl)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
