//! Fixed-window rate limiting over the shared store.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::AuthError;
use crate::store::KvStore;

/// Budget for one window: at most `max_count` calls per `window`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_count: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    #[must_use]
    pub const fn new(max_count: u32, window: Duration) -> Self {
        Self { max_count, window }
    }
}

/// Counts calls per (scope, subject, resource) key in fixed windows.
///
/// The window is fixed, not sliding: the budget resets the instant the
/// counter key expires, wherever within the window the calls landed.
/// Burst-at-boundary is accepted.
pub struct RateLimiter {
    store: Arc<dyn KvStore>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Spend one unit of the window budget.
    ///
    /// The counter bump and the window arming are one atomic store call,
    /// so concurrent callers cannot each observe "absent" and overshoot
    /// the budget. A denied call still bumps the counter, which never
    /// extends the window or changes the allowed budget.
    ///
    /// # Errors
    ///
    /// `RateLimited` when the budget for the current window is spent;
    /// `Store` on backend failure.
    pub async fn check(
        &self,
        scope: &str,
        subject: &str,
        resource: &str,
        policy: RateLimitPolicy,
    ) -> Result<(), AuthError> {
        let key = rate_key(scope, subject, resource);
        let count = self.store.increment_with_ttl(&key, policy.window).await?;
        if count > i64::from(policy.max_count) {
            debug!(scope, subject, resource, count, "rate limit exceeded");
            return Err(AuthError::RateLimited);
        }
        Ok(())
    }
}

fn rate_key(scope: &str, subject: &str, resource: &str) -> String {
    format!("rate:{scope}:{subject}:{resource}")
}
