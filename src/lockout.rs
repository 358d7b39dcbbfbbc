//! Failed-login tracking and temporary account lockout.
//!
//! Two keys per identity: a failure counter with an evaluation-window
//! TTL, and a lock marker with a lock-duration TTL. The marker's expiry
//! reopens the account with no further bookkeeping.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::error::AuthError;
use crate::store::KvStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Consecutive failures that trip the lock.
    pub max_failures: u32,
    /// How long failures keep counting against the same streak.
    pub evaluation_window: Duration,
    /// How long a tripped lock holds.
    pub lock_duration: Duration,
}

impl LockoutPolicy {
    #[must_use]
    pub const fn new(
        max_failures: u32,
        evaluation_window: Duration,
        lock_duration: Duration,
    ) -> Self {
        Self {
            max_failures,
            evaluation_window,
            lock_duration,
        }
    }
}

/// Guards the credential-verification step of login.
///
/// Call [`Self::check`] before comparing credentials so a locked
/// identity never reaches that step; call [`Self::record_failure`] on a
/// bad attempt and [`Self::clear`] on success.
pub struct LockoutGuard {
    store: Arc<dyn KvStore>,
    policy: LockoutPolicy,
}

impl LockoutGuard {
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>, policy: LockoutPolicy) -> Self {
        Self { store, policy }
    }

    /// Deny while the lock marker is live.
    ///
    /// # Errors
    ///
    /// `AccountLocked` while locked; `Store` on backend failure.
    pub async fn check(&self, identity: &str) -> Result<(), AuthError> {
        if self.store.exists(&lock_key(identity)).await? {
            return Err(AuthError::AccountLocked);
        }
        Ok(())
    }

    /// Count one failed attempt; trip the lock when the streak reaches
    /// the threshold. Returns the post-increment failure count.
    ///
    /// The counter bump and its window TTL are one atomic store call, so
    /// concurrent failures cannot under-count the streak.
    ///
    /// # Errors
    ///
    /// `Store` on backend failure.
    pub async fn record_failure(&self, identity: &str) -> Result<u32, AuthError> {
        let failures = self
            .store
            .increment_with_ttl(&fail_key(identity), self.policy.evaluation_window)
            .await?;

        if failures >= i64::from(self.policy.max_failures) {
            self.store
                .set(&lock_key(identity), "1", self.policy.lock_duration)
                .await?;
            warn!(identity, failures, "identity locked after repeated failures");
        }
        Ok(u32::try_from(failures).unwrap_or(u32::MAX))
    }

    /// Reset the failure streak after a successful authentication.
    /// Partial progress toward the threshold is not retained.
    ///
    /// # Errors
    ///
    /// `Store` on backend failure.
    pub async fn clear(&self, identity: &str) -> Result<(), AuthError> {
        self.store.delete(&fail_key(identity)).await?;
        Ok(())
    }

    /// Admin unlock: drop the lock marker and the failure streak.
    ///
    /// # Errors
    ///
    /// `Store` on backend failure.
    pub async fn unlock(&self, identity: &str) -> Result<(), AuthError> {
        self.store.delete(&lock_key(identity)).await?;
        self.store.delete(&fail_key(identity)).await?;
        Ok(())
    }
}

fn fail_key(identity: &str) -> String {
    format!("lockout:fails:{identity}")
}

fn lock_key(identity: &str) -> String {
    format!("lockout:lock:{identity}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ManualClock, MemoryStore};

    const POLICY: LockoutPolicy =
        LockoutPolicy::new(5, Duration::from_secs(900), Duration::from_secs(300));

    fn guard_with_clock() -> (LockoutGuard, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        (LockoutGuard::new(store, POLICY), clock)
    }

    #[tokio::test]
    async fn five_failures_lock_the_identity() -> anyhow::Result<()> {
        let (guard, _clock) = guard_with_clock();

        for attempt in 1..=4u32 {
            assert_eq!(guard.record_failure("alice").await?, attempt);
            guard.check("alice").await?;
        }
        assert_eq!(guard.record_failure("alice").await?, 5);
        assert!(matches!(
            guard.check("alice").await,
            Err(AuthError::AccountLocked)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn lock_expires_after_its_duration() -> anyhow::Result<()> {
        let (guard, clock) = guard_with_clock();

        for _ in 0..5 {
            guard.record_failure("alice").await?;
        }
        assert!(guard.check("alice").await.is_err());

        clock.advance(Duration::from_secs(300));
        guard.check("alice").await?;
        Ok(())
    }

    #[tokio::test]
    async fn clear_resets_partial_progress() -> anyhow::Result<()> {
        let (guard, _clock) = guard_with_clock();

        for _ in 0..3 {
            guard.record_failure("alice").await?;
        }
        // Successful login at three failures wipes the streak.
        guard.clear("alice").await?;

        assert_eq!(guard.record_failure("alice").await?, 1);
        guard.check("alice").await?;
        Ok(())
    }

    #[tokio::test]
    async fn stale_streak_expires_with_the_evaluation_window() -> anyhow::Result<()> {
        let (guard, clock) = guard_with_clock();

        for _ in 0..4 {
            guard.record_failure("alice").await?;
        }
        clock.advance(Duration::from_secs(901));

        // The old streak is gone; this failure starts a new one.
        assert_eq!(guard.record_failure("alice").await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn unlock_reopens_immediately() -> anyhow::Result<()> {
        let (guard, _clock) = guard_with_clock();

        for _ in 0..5 {
            guard.record_failure("alice").await?;
        }
        assert!(guard.check("alice").await.is_err());

        guard.unlock("alice").await?;
        guard.check("alice").await?;
        assert_eq!(guard.record_failure("alice").await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn identities_are_independent() -> anyhow::Result<()> {
        let (guard, _clock) = guard_with_clock();

        for _ in 0..5 {
            guard.record_failure("alice").await?;
        }
        guard.check("bob").await?;
        Ok(())
    }
}
