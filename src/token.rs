//! Stateless signed-token issuance and validation.
//!
//! Tokens are self-contained HS256 JWTs signed with a process-wide
//! secret: no store round-trip on validation. Logout therefore does not
//! revoke an issued token; see [`crate::session::SessionRegistry`] for
//! the best-effort bookkeeping side of that trade-off.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Caller role carried inside the token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "USER")]
    User,
    #[serde(rename = "VIP")]
    Vip,
    #[serde(rename = "ADMIN")]
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Vip => "VIP",
            Self::Admin => "ADMIN",
        }
    }
}

/// Claims embedded in every issued token; never persisted server-side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub role: Role,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and validates bearer tokens. Pure computation over the signing
/// secret and the clock; safe to share across tasks.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    token_ttl: Duration,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &SecretString, issuer: impl Into<String>, token_ttl: Duration) -> Self {
        let secret = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: issuer.into(),
            token_ttl,
        }
    }

    /// Issue a token for `subject_id` with the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns `TokenEncoding` when the claims cannot be serialized.
    pub fn issue(&self, subject_id: i64, username: &str, role: Role) -> Result<String, AuthError> {
        self.issue_with_ttl(subject_id, username, role, self.token_ttl)
    }

    /// Issue a token with an explicit lifetime.
    ///
    /// # Errors
    ///
    /// Returns `TokenEncoding` when the claims cannot be serialized.
    pub fn issue_with_ttl(
        &self,
        subject_id: i64,
        username: &str,
        role: Role,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let now = now_unix_seconds();
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: subject_id,
            username: username.to_string(),
            role,
            iss: self.issuer.clone(),
            iat: now,
            exp: now.saturating_add(ttl),
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AuthError::TokenEncoding)
    }

    /// Validate `token` against the current time.
    ///
    /// # Errors
    ///
    /// `TokenMalformed`, `TokenSignatureInvalid`, `TokenIssuerMismatch`,
    /// or `TokenExpired`.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate_at(token, now_unix_seconds())
    }

    /// Validate `token` as of `now_unix_seconds`. Expiry is strict: a
    /// token is live only while `now < exp`.
    ///
    /// # Errors
    ///
    /// Same kinds as [`Self::validate`].
    pub fn validate_at(&self, token: &str, now_unix_seconds: i64) -> Result<Claims, AuthError> {
        // The signature (constant-time HMAC) and structure are checked by
        // jsonwebtoken; issuer and expiry are checked here against the
        // caller-provided clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(map_jwt_error)?;
        let claims = data.claims;

        if claims.iss != self.issuer {
            return Err(AuthError::TokenIssuerMismatch);
        }
        if now_unix_seconds >= claims.exp {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }

    /// Reissue a fresh token carrying the same subject, username, and
    /// role. Any token that still validates may be refreshed; closeness
    /// to expiry is not required.
    ///
    /// # Errors
    ///
    /// Validation kinds for the old token, or `TokenEncoding`.
    pub fn refresh(&self, token: &str) -> Result<String, AuthError> {
        let claims = self.validate(token)?;
        self.issue(claims.sub, &claims.username, claims.role)
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;
    match err.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
            AuthError::TokenSignatureInvalid
        }
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::TokenMalformed,
    }
}

fn now_unix_seconds() -> i64 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    i64::try_from(secs).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(
            &SecretString::from("test-secret-key".to_string()),
            "gardisto.test",
            Duration::from_secs(3600),
        )
    }

    #[test]
    fn round_trip_preserves_claims() -> Result<(), AuthError> {
        let tokens = service();
        let token = tokens.issue(42, "alice", Role::Vip)?;

        let claims = tokens.validate(&token)?;
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, Role::Vip);
        assert_eq!(claims.iss, "gardisto.test");
        assert_eq!(claims.exp, claims.iat + 3600);
        Ok(())
    }

    #[test]
    fn zero_ttl_token_is_already_expired() -> Result<(), AuthError> {
        let tokens = service();
        let token = tokens.issue_with_ttl(1, "alice", Role::User, Duration::ZERO)?;
        assert!(matches!(
            tokens.validate(&token),
            Err(AuthError::TokenExpired)
        ));
        Ok(())
    }

    #[test]
    fn validate_at_enforces_strict_expiry() -> Result<(), AuthError> {
        let tokens = service();
        let token = tokens.issue(1, "alice", Role::User)?;
        let claims = tokens.validate(&token)?;

        // Live one second before expiry, expired at the boundary itself.
        assert!(tokens.validate_at(&token, claims.exp - 1).is_ok());
        assert!(matches!(
            tokens.validate_at(&token, claims.exp),
            Err(AuthError::TokenExpired)
        ));
        Ok(())
    }

    #[test]
    fn wrong_secret_is_a_signature_error() -> Result<(), AuthError> {
        let tokens = service();
        let other = TokenService::new(
            &SecretString::from("another-secret".to_string()),
            "gardisto.test",
            Duration::from_secs(3600),
        );
        let token = tokens.issue(1, "alice", Role::User)?;
        assert!(matches!(
            other.validate(&token),
            Err(AuthError::TokenSignatureInvalid)
        ));
        Ok(())
    }

    #[test]
    fn wrong_issuer_is_rejected() -> Result<(), AuthError> {
        let tokens = service();
        let foreign = TokenService::new(
            &SecretString::from("test-secret-key".to_string()),
            "someone-else",
            Duration::from_secs(3600),
        );
        let token = foreign.issue(1, "alice", Role::User)?;
        assert!(matches!(
            tokens.validate(&token),
            Err(AuthError::TokenIssuerMismatch)
        ));
        Ok(())
    }

    #[test]
    fn garbage_is_malformed() {
        let tokens = service();
        assert!(matches!(
            tokens.validate("not-a-token"),
            Err(AuthError::TokenMalformed)
        ));
        assert!(matches!(
            tokens.validate(""),
            Err(AuthError::TokenMalformed)
        ));
    }

    #[test]
    fn refresh_reissues_same_subject() -> Result<(), AuthError> {
        let tokens = service();
        let token = tokens.issue(7, "bob", Role::Admin)?;
        let refreshed = tokens.refresh(&token)?;

        let claims = tokens.validate(&refreshed)?;
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.username, "bob");
        assert_eq!(claims.role, Role::Admin);
        Ok(())
    }

    #[test]
    fn refresh_rejects_expired_tokens() -> Result<(), AuthError> {
        let tokens = service();
        let token = tokens.issue_with_ttl(7, "bob", Role::User, Duration::ZERO)?;
        assert!(matches!(
            tokens.refresh(&token),
            Err(AuthError::TokenExpired)
        ));
        Ok(())
    }

    #[test]
    fn role_serializes_uppercase() {
        assert_eq!(Role::User.as_str(), "USER");
        assert_eq!(
            serde_json::to_string(&Role::Admin).ok().as_deref(),
            Some("\"ADMIN\"")
        );
    }
}
