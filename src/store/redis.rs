//! Redis-backed store for fleet deployments.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};

use super::{KvStore, StoreError};

// INCR and EXPIRE must land as one step; a client-side INCR-then-EXPIRE
// pair leaves an immortal counter when the process dies in between.
const INCR_WITH_TTL: &str = r"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
  redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return count
";

/// Store implementation over a shared Redis, one command per primitive.
/// The connection manager reconnects on its own; failures surface as
/// `StoreError::Unavailable`.
pub struct RedisStore {
    conn: ConnectionManager,
    incr_with_ttl: Script,
}

impl RedisStore {
    /// Connect to Redis at `url` (`redis://host:port/db`).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` when the URL does not parse or
    /// the initial connection cannot be established.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(map_redis_error)?;
        Ok(Self {
            conn,
            incr_with_ttl: Script::new(INCR_WITH_TTL),
        })
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(map_redis_error)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.set_ex(key, value, ttl_secs(ttl))
            .await
            .map_err(map_redis_error)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await.map_err(map_redis_error)?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        conn.exists(key).await.map_err(map_redis_error)
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        conn.incr(key, 1i64).await.map_err(map_redis_error)
    }

    async fn increment_with_ttl(&self, key: &str, ttl: Duration) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        self.incr_with_ttl
            .key(key)
            .arg(ttl_secs(ttl))
            .invoke_async(&mut conn)
            .await
            .map_err(map_redis_error)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let secs = i64::try_from(ttl_secs(ttl)).unwrap_or(i64::MAX);
        conn.expire(key, secs).await.map_err(map_redis_error)
    }

    async fn ttl_remaining(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let mut conn = self.conn.clone();
        let ttl: i64 = conn.ttl(key).await.map_err(map_redis_error)?;
        // -2 means no key, -1 means no expiry; both read as absent here.
        match u64::try_from(ttl) {
            Ok(secs) => Ok(Some(Duration::from_secs(secs))),
            Err(_) => Ok(None),
        }
    }
}

/// Redis expiries have whole-second granularity; fractional TTLs round up
/// so a short-lived key never becomes immortal or instantly expired.
fn ttl_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs();
    if ttl.subsec_nanos() > 0 || secs == 0 {
        secs.saturating_add(1)
    } else {
        secs
    }
}

fn map_redis_error(err: redis::RedisError) -> StoreError {
    if err.kind() == redis::ErrorKind::TypeError {
        StoreError::NotACounter
    } else {
        StoreError::Unavailable(err.to_string())
    }
}
