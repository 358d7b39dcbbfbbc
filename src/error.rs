//! Outward error taxonomy for the auth core.
//!
//! Components return these kinds instead of throwing opaque errors; the
//! boundary layer owns the single translation into transport status
//! codes (see `guard`). Nothing in the core retries; backoff policy
//! lives with the caller.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The credential does not parse as a token.
    #[error("malformed token")]
    TokenMalformed,
    /// The token parses but its signature does not verify.
    #[error("invalid token signature")]
    TokenSignatureInvalid,
    /// The token was not issued by this deployment.
    #[error("token issuer mismatch")]
    TokenIssuerMismatch,
    /// The token's lifetime has elapsed; re-authentication required.
    #[error("token expired")]
    TokenExpired,
    /// Claims could not be encoded into a token.
    #[error("token encoding failed")]
    TokenEncoding,
    /// Wrong one-time code; the stored code remains valid for retries.
    #[error("verification code mismatch")]
    CodeMismatch,
    /// No code stored for this purpose and target, either never sent,
    /// already consumed, or expired. A new code must be requested.
    #[error("verification code expired or unknown")]
    CodeExpiredOrUnknown,
    /// Fixed-window budget exhausted; recoverable once the window ends.
    #[error("rate limited")]
    RateLimited,
    /// Identity is locked out; recoverable once the lock expires.
    #[error("account locked")]
    AccountLocked,
    /// The caller's role is not in the required capability set.
    #[error("insufficient role")]
    RoleDenied,
    /// Infrastructure failure from the shared store, never a denial.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Transport status for this kind. The mapping lives here so every
    /// boundary translates identically.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::TokenMalformed
            | Self::TokenSignatureInvalid
            | Self::TokenIssuerMismatch
            | Self::TokenExpired => 401,
            Self::CodeMismatch | Self::CodeExpiredOrUnknown => 400,
            Self::RoleDenied => 403,
            Self::AccountLocked => 423,
            Self::RateLimited => 429,
            Self::TokenEncoding | Self::Store(_) => 500,
        }
    }

    /// Whether the caller can recover by waiting or retrying with new
    /// input, as opposed to re-authenticating.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::CodeMismatch
                | Self::CodeExpiredOrUnknown
                | Self::RateLimited
                | Self::AccountLocked
        )
    }
}
