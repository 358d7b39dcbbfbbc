//! Best-effort session bookkeeping for logout and presence.
//!
//! Maps a subject to its last-issued token. Token validation never
//! consults this registry: a token stays valid until its own expiry even
//! after `remove` (logout is UI-level, not revocation). Presence queries
//! are display-only and must not gate access control.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::store::{KvStore, StoreError};

pub struct SessionRegistry {
    store: Arc<dyn KvStore>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Record `token` as the subject's current session. A login or
    /// refresh overwrites the previous entry.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the backend is unavailable.
    pub async fn save(
        &self,
        subject_id: i64,
        token: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        self.store.set(&session_key(subject_id), token, ttl).await
    }

    /// The subject's current token, if any.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the backend is unavailable.
    pub async fn get(&self, subject_id: i64) -> Result<Option<String>, StoreError> {
        self.store.get(&session_key(subject_id)).await
    }

    /// Drop the subject's session entry (logout). Idempotent; removing
    /// an absent entry reports `false`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the backend is unavailable.
    pub async fn remove(&self, subject_id: i64) -> Result<bool, StoreError> {
        let removed = self.store.delete(&session_key(subject_id)).await?;
        debug!(subject_id, removed, "session removed");
        Ok(removed)
    }

    /// Presence for display purposes only.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the backend is unavailable.
    pub async fn is_online(&self, subject_id: i64) -> Result<bool, StoreError> {
        self.store.exists(&session_key(subject_id)).await
    }
}

fn session_key(subject_id: i64) -> String {
    format!("session:{subject_id}")
}
