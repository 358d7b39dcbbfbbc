//! In-process store for tests and single-node deployments.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{Clock, KvStore, StoreError, SystemClock};

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// Hash map behind a single mutex. Every trait operation runs inside one
/// lock section, which makes each primitive atomic, including
/// `increment_with_ttl`. Expired entries are dropped lazily on access.
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Remove the entry when it has expired; otherwise leave it in place.
    fn prune(entries: &mut HashMap<String, Entry>, key: &str, now: Instant) {
        if entries.get(key).is_some_and(|entry| !entry.live(now)) {
            entries.remove(key);
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        Self::prune(&mut entries, key, now);
        Ok(entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(now + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        Self::prune(&mut entries, key, now);
        Ok(entries.remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        Self::prune(&mut entries, key, now);
        Ok(entries.contains_key(key))
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        Self::prune(&mut entries, key, now);
        increment_entry(&mut entries, key, None)
    }

    async fn increment_with_ttl(&self, key: &str, ttl: Duration) -> Result<i64, StoreError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        Self::prune(&mut entries, key, now);
        increment_entry(&mut entries, key, Some(now + ttl))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        Self::prune(&mut entries, key, now);
        match entries.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(now + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ttl_remaining(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        Self::prune(&mut entries, key, now);
        Ok(entries
            .get(key)
            .and_then(|entry| entry.expires_at)
            .map(|at| at - now))
    }
}

/// Bump the counter at `key`. `created_expiry` applies only when the key
/// is created by this call; an existing entry keeps its expiry.
fn increment_entry(
    entries: &mut HashMap<String, Entry>,
    key: &str,
    created_expiry: Option<Instant>,
) -> Result<i64, StoreError> {
    match entries.get_mut(key) {
        Some(entry) => {
            let count: i64 = entry
                .value
                .parse()
                .map_err(|_| StoreError::NotACounter)?;
            let count = count.saturating_add(1);
            entry.value = count.to_string();
            Ok(count)
        }
        None => {
            entries.insert(
                key.to_string(),
                Entry {
                    value: "1".to_string(),
                    expires_at: created_expiry,
                },
            );
            Ok(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ManualClock;

    fn store_with_clock() -> (MemoryStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (MemoryStore::with_clock(clock.clone()), clock)
    }

    #[tokio::test]
    async fn set_get_round_trip() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        store.set("k", "v", Duration::from_secs(60)).await?;
        assert_eq!(store.get("k").await?.as_deref(), Some("v"));
        assert!(store.exists("k").await?);
        Ok(())
    }

    #[tokio::test]
    async fn expired_key_reads_as_absent() -> anyhow::Result<()> {
        let (store, clock) = store_with_clock();
        store.set("k", "v", Duration::from_secs(30)).await?;

        clock.advance(Duration::from_secs(31));
        assert_eq!(store.get("k").await?, None);
        assert!(!store.exists("k").await?);
        assert!(!store.delete("k").await?);
        assert_eq!(store.ttl_remaining("k").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn increment_creates_at_one_without_ttl() -> anyhow::Result<()> {
        let (store, clock) = store_with_clock();
        assert_eq!(store.increment("n").await?, 1);
        assert_eq!(store.increment("n").await?, 2);
        assert_eq!(store.ttl_remaining("n").await?, None);

        // No TTL attached, so the counter survives arbitrary time.
        clock.advance(Duration::from_secs(86_400));
        assert_eq!(store.increment("n").await?, 3);
        Ok(())
    }

    #[tokio::test]
    async fn increment_with_ttl_arms_only_on_create() -> anyhow::Result<()> {
        let (store, clock) = store_with_clock();
        assert_eq!(
            store.increment_with_ttl("n", Duration::from_secs(60)).await?,
            1
        );
        clock.advance(Duration::from_secs(40));

        // Second bump must not push the expiry out.
        assert_eq!(
            store.increment_with_ttl("n", Duration::from_secs(60)).await?,
            2
        );
        assert_eq!(
            store.ttl_remaining("n").await?,
            Some(Duration::from_secs(20))
        );

        clock.advance(Duration::from_secs(21));
        assert_eq!(
            store.increment_with_ttl("n", Duration::from_secs(60)).await?,
            1
        );
        Ok(())
    }

    #[tokio::test]
    async fn increment_rejects_non_counter_values() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        store.set("k", "not-a-number", Duration::from_secs(60)).await?;
        assert!(matches!(
            store.increment("k").await,
            Err(StoreError::NotACounter)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn expire_attaches_ttl_to_live_keys_only() -> anyhow::Result<()> {
        let (store, clock) = store_with_clock();
        assert!(!store.expire("missing", Duration::from_secs(5)).await?);

        store.increment("n").await?;
        assert!(store.expire("n", Duration::from_secs(5)).await?);
        clock.advance(Duration::from_secs(6));
        assert!(!store.exists("n").await?);
        Ok(())
    }

    #[tokio::test]
    async fn set_overwrites_value_and_ttl() -> anyhow::Result<()> {
        let (store, clock) = store_with_clock();
        store.set("k", "old", Duration::from_secs(10)).await?;
        store.set("k", "new", Duration::from_secs(100)).await?;

        clock.advance(Duration::from_secs(50));
        assert_eq!(store.get("k").await?.as_deref(), Some("new"));
        Ok(())
    }
}
