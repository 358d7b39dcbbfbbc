//! Shared key-value store with per-key TTL.
//!
//! Every component in this crate keeps its state behind the [`KvStore`]
//! trait: a cache of string keys with optional time-to-live. Single-key
//! operations are atomic; there are no multi-key transactions. An expired
//! key is indistinguishable from one that was never set.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;

mod memory;
mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// Infrastructure failures from the store backend.
///
/// These are never domain decisions: a backend outage must not be
/// conflated with a rate-limit or lockout denial. Whether to fail open
/// or closed on outage is the caller's deployment choice.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend unavailable: {0}")]
    Unavailable(String),
    #[error("stored value is not a counter")]
    NotACounter,
}

/// Shared cache contract used by every component.
///
/// `increment_with_ttl` is the atomic create-and-arm primitive: it
/// increments (creating the key at 1) and attaches `ttl` only when the
/// key was just created, as one atomic step. Composing `increment` with
/// `expire` instead would reintroduce the check-then-act race this
/// primitive exists to close.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Set `key` to `value`, replacing any prior value and TTL.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Delete `key`. Returns `true` when a live key was removed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Increment the counter at `key`, creating it at 1 with no TTL.
    async fn increment(&self, key: &str) -> Result<i64, StoreError>;

    /// Increment the counter at `key`; when the key is created by this
    /// call, attach `ttl` in the same atomic step. An existing key keeps
    /// its TTL untouched.
    async fn increment_with_ttl(&self, key: &str, ttl: Duration) -> Result<i64, StoreError>;

    /// Attach `ttl` to a live key. Returns `false` when the key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// Remaining TTL of a live key; `None` when the key is absent or has
    /// no expiry attached.
    async fn ttl_remaining(&self, key: &str) -> Result<Option<Duration>, StoreError>;
}

/// Time source for TTL bookkeeping in [`MemoryStore`].
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Lets tests cross TTL boundaries
/// without sleeping.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset_ms: std::sync::atomic::AtomicU64,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset_ms: std::sync::atomic::AtomicU64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        let millis = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.offset_ms
            .fetch_add(millis, std::sync::atomic::Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = self.offset_ms.load(std::sync::atomic::Ordering::SeqCst);
        self.base + Duration::from_millis(offset)
    }
}
