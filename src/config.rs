//! Configuration surface for the auth core.
//!
//! Values are plain data with usable defaults; loading them from env,
//! flags, or files belongs to the host service.

use std::time::Duration;

use secrecy::SecretString;

use crate::lockout::LockoutPolicy;
use crate::rate_limit::RateLimitPolicy;

const DEFAULT_TOKEN_TTL_SECONDS: u64 = 2 * 60 * 60;
const DEFAULT_CODE_TTL_SECONDS: u64 = 5 * 60;
const DEFAULT_CODE_LENGTH: usize = 6;
const DEFAULT_RATE_MAX_COUNT: u32 = 60;
const DEFAULT_RATE_WINDOW_SECONDS: u64 = 60;
const DEFAULT_MAX_FAILURES: u32 = 5;
const DEFAULT_EVALUATION_WINDOW_SECONDS: u64 = 15 * 60;
const DEFAULT_LOCK_DURATION_SECONDS: u64 = 5 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    token_secret: SecretString,
    issuer: String,
    token_ttl_seconds: u64,
    code_ttl_seconds: u64,
    code_length: usize,
    rate_max_count: u32,
    rate_window_seconds: u64,
    max_failures: u32,
    evaluation_window_seconds: u64,
    lock_duration_seconds: u64,
    session_ttl_seconds: Option<u64>,
}

impl AuthConfig {
    #[must_use]
    pub fn new(token_secret: SecretString, issuer: String) -> Self {
        Self {
            token_secret,
            issuer,
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            code_ttl_seconds: DEFAULT_CODE_TTL_SECONDS,
            code_length: DEFAULT_CODE_LENGTH,
            rate_max_count: DEFAULT_RATE_MAX_COUNT,
            rate_window_seconds: DEFAULT_RATE_WINDOW_SECONDS,
            max_failures: DEFAULT_MAX_FAILURES,
            evaluation_window_seconds: DEFAULT_EVALUATION_WINDOW_SECONDS,
            lock_duration_seconds: DEFAULT_LOCK_DURATION_SECONDS,
            session_ttl_seconds: None,
        }
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: u64) -> Self {
        self.token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_code_ttl_seconds(mut self, seconds: u64) -> Self {
        self.code_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_code_length(mut self, length: usize) -> Self {
        self.code_length = length;
        self
    }

    #[must_use]
    pub fn with_rate_limit(mut self, max_count: u32, window_seconds: u64) -> Self {
        self.rate_max_count = max_count;
        self.rate_window_seconds = window_seconds;
        self
    }

    #[must_use]
    pub fn with_lockout(
        mut self,
        max_failures: u32,
        evaluation_window_seconds: u64,
        lock_duration_seconds: u64,
    ) -> Self {
        self.max_failures = max_failures;
        self.evaluation_window_seconds = evaluation_window_seconds;
        self.lock_duration_seconds = lock_duration_seconds;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: u64) -> Self {
        self.session_ttl_seconds = Some(seconds);
        self
    }

    #[must_use]
    pub fn token_secret(&self) -> &SecretString {
        &self.token_secret
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_seconds)
    }

    #[must_use]
    pub fn code_ttl(&self) -> Duration {
        Duration::from_secs(self.code_ttl_seconds)
    }

    #[must_use]
    pub fn code_length(&self) -> usize {
        self.code_length
    }

    /// Default per-route budget; route classes that need their own pass
    /// a different policy to the limiter call.
    #[must_use]
    pub fn rate_limit_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy::new(
            self.rate_max_count,
            Duration::from_secs(self.rate_window_seconds),
        )
    }

    #[must_use]
    pub fn lockout_policy(&self) -> LockoutPolicy {
        LockoutPolicy::new(
            self.max_failures,
            Duration::from_secs(self.evaluation_window_seconds),
            Duration::from_secs(self.lock_duration_seconds),
        )
    }

    /// Session entries live as long as the token unless overridden.
    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_seconds.unwrap_or(self.token_ttl_seconds))
    }
}
