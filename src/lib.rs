//! # Gardisto (Authentication & Abuse-Control Core)
//!
//! `gardisto` is the authentication and abuse-control core for services
//! that keep their hot security state in a shared TTL key-value cache:
//! signed bearer tokens, one-time verification codes, fixed-window rate
//! limiting, failed-login lockout, and best-effort session bookkeeping.
//!
//! ## Architecture
//!
//! Every component is stateless and depends only on the [`store::KvStore`]
//! abstraction; concurrent callers across a fleet coordinate through the
//! store's single-key atomic primitives. Components are constructed once
//! at startup and passed explicitly to their consumers; there is no
//! runtime container.
//!
//! - **Tokens** are self-contained HS256 JWTs; validation is pure
//!   computation with no store round-trip. Logout is therefore
//!   best-effort: removing a [`SessionRegistry`] entry does not revoke
//!   an issued token.
//! - **Counters** (rate windows, failure streaks) are armed with their
//!   TTL in the same atomic step that creates them, so two concurrent
//!   callers can never both observe "absent" and overshoot a budget.
//! - **Denials vs. outages**: domain denials (`RateLimited`,
//!   `AccountLocked`, code mismatches) are typed [`AuthError`] kinds; a
//!   store outage surfaces separately as `AuthError::Store` so callers
//!   can decide their own fail-open/fail-closed policy.
//!
//! The boundary layer (see [`guard`]) extracts the bearer credential,
//! validates it, and checks the handler's role capability set before the
//! handler body runs; it owns the single translation of [`AuthError`]
//! into transport status codes.

pub mod config;
pub mod error;
pub mod guard;
pub mod lockout;
pub mod rate_limit;
pub mod session;
pub mod store;
pub mod token;
pub mod verification;

pub use config::AuthConfig;
pub use error::AuthError;
pub use lockout::{LockoutGuard, LockoutPolicy};
pub use rate_limit::{RateLimitPolicy, RateLimiter};
pub use session::SessionRegistry;
pub use store::{Clock, KvStore, ManualClock, MemoryStore, RedisStore, StoreError, SystemClock};
pub use token::{Claims, Role, TokenService};
pub use verification::VerificationCodes;
