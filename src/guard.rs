//! Explicit boundary guards.
//!
//! The web layer pulls the bearer credential out of the request, turns
//! it into [`Claims`], and checks the handler's capability set before
//! the handler body runs. Role checks are plain function calls, not an
//! interception framework. This module also owns the one place where
//! [`AuthError`] becomes a transport response.

use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{debug, error};

use crate::error::AuthError;
use crate::token::{Claims, Role, TokenService};

/// Extract the raw token from an `Authorization: Bearer <token>` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Resolve request headers into validated claims.
///
/// # Errors
///
/// `TokenMalformed` when no bearer credential is present; otherwise the
/// validation kinds of [`TokenService::validate`].
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Result<Claims, AuthError> {
    let token = bearer_token(headers).ok_or(AuthError::TokenMalformed)?;
    tokens.validate(token)
}

/// Check the caller's role against a handler's capability set.
///
/// # Errors
///
/// `RoleDenied` when the role is not in `allowed`.
pub fn require_role(claims: &Claims, allowed: &[Role]) -> Result<(), AuthError> {
    if allowed.contains(&claims.role) {
        Ok(())
    } else {
        debug!(
            subject = claims.sub,
            role = claims.role.as_str(),
            "role not in capability set"
        );
        Err(AuthError::RoleDenied)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let Self::Store(ref err) = self {
            // Infrastructure failures get logged here; domain denials
            // are normal traffic and stay quiet.
            error!("store failure at the boundary: {err}");
        }
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, self.to_string()).into_response()
    }
}
