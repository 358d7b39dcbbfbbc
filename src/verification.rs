//! One-time verification codes keyed by purpose and target.
//!
//! A code lives at most once: the first successful match deletes it. A
//! newer send for the same (purpose, target) overwrites the previous
//! code: last write wins, only the latest code is valid.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::OsRng;
use rand::Rng;
use tracing::debug;

use crate::error::AuthError;
use crate::store::KvStore;

// Captcha alphabet skips 0/O/1/I/L to stay legible when rendered.
const CAPTCHA_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CodeFormat {
    /// Digits only, leading zeros preserved, compared exactly.
    Numeric,
    /// Captcha letters and digits, compared case-insensitively.
    Alphanumeric,
}

/// Issues and consumes bounded-lifetime one-time codes.
pub struct VerificationCodes {
    store: Arc<dyn KvStore>,
    format: CodeFormat,
    length: usize,
    ttl: Duration,
}

impl VerificationCodes {
    /// Numeric codes (email/SMS style), compared case-sensitively.
    #[must_use]
    pub fn numeric(store: Arc<dyn KvStore>, length: usize, ttl: Duration) -> Self {
        Self {
            store,
            format: CodeFormat::Numeric,
            length,
            ttl,
        }
    }

    /// Captcha-style alphanumeric codes, compared case-insensitively.
    #[must_use]
    pub fn captcha(store: Arc<dyn KvStore>, length: usize, ttl: Duration) -> Self {
        Self {
            store,
            format: CodeFormat::Alphanumeric,
            length,
            ttl,
        }
    }

    /// Generate a fresh code for (`purpose`, `target`) and store it with
    /// the configured TTL, invalidating any previous unexpired code.
    ///
    /// # Errors
    ///
    /// Returns `Store` when the backend is unavailable.
    pub async fn send(&self, purpose: &str, target: &str) -> Result<String, AuthError> {
        let code = self.generate();
        self.store.set(&code_key(purpose, target), &code, self.ttl).await?;
        debug!(purpose, target, "verification code issued");
        Ok(code)
    }

    /// Check `candidate` against the stored code and consume it on match.
    ///
    /// A mismatch keeps the stored code so the caller may retry until it
    /// expires; a match deletes it before returning, so a given code
    /// verifies at most once.
    ///
    /// # Errors
    ///
    /// `CodeExpiredOrUnknown` when nothing is stored (never sent,
    /// expired, or already consumed), `CodeMismatch` on a wrong
    /// candidate, `Store` on backend failure.
    pub async fn verify(
        &self,
        purpose: &str,
        target: &str,
        candidate: &str,
    ) -> Result<(), AuthError> {
        let key = code_key(purpose, target);
        let Some(stored) = self.store.get(&key).await? else {
            return Err(AuthError::CodeExpiredOrUnknown);
        };

        if !self.matches(&stored, candidate) {
            debug!(purpose, target, "verification code mismatch");
            return Err(AuthError::CodeMismatch);
        }

        // Whoever deletes the key consumed the code; a concurrent verify
        // that matched the same value loses here.
        if self.store.delete(&key).await? {
            Ok(())
        } else {
            Err(AuthError::CodeExpiredOrUnknown)
        }
    }

    fn generate(&self) -> String {
        let mut rng = OsRng;
        match self.format {
            CodeFormat::Numeric => (0..self.length)
                .map(|_| char::from(b'0' + rng.gen_range(0..10)))
                .collect(),
            CodeFormat::Alphanumeric => (0..self.length)
                .map(|_| char::from(CAPTCHA_ALPHABET[rng.gen_range(0..CAPTCHA_ALPHABET.len())]))
                .collect(),
        }
    }

    fn matches(&self, stored: &str, candidate: &str) -> bool {
        match self.format {
            CodeFormat::Numeric => stored == candidate,
            CodeFormat::Alphanumeric => stored.eq_ignore_ascii_case(candidate),
        }
    }
}

fn code_key(purpose: &str, target: &str) -> String {
    format!("code:{purpose}:{target}")
}
