// Token lifecycle shared by both backends.
//
// `TokenState` is an immutable snapshot; clients keep it in a `TokenCell`
// and swap it wholesale. The lock is never held across an await.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, TimeDelta, Utc};
use futures_util::future::BoxFuture;
use secrecy::SecretString;

use crate::error::Error;

/// A token is refreshed once it is within this margin of its expiry.
pub const CLOCK_SKEW_MARGIN: TimeDelta = TimeDelta::seconds(20);

/// Lifetime assumed for a local gateway session token.
///
/// The gateway's login response carries no expiry, so this is policy.
pub const LOCAL_TOKEN_TTL: TimeDelta = TimeDelta::seconds(3600);

/// Async callback producing a fresh cloud access token.
///
/// Invoked before every cloud request when configured.
pub type TokenRefresh = Arc<dyn Fn() -> BoxFuture<'static, Result<SecretString, Error>> + Send + Sync>;

/// Current bearer token and its expiry.
#[derive(Debug, Clone)]
pub struct TokenState {
    token: Option<SecretString>,
    expires_at: DateTime<Utc>,
}

impl Default for TokenState {
    fn default() -> Self {
        Self::empty()
    }
}

impl TokenState {
    /// Unauthenticated: no token, already expired.
    pub fn empty() -> Self {
        Self {
            token: None,
            expires_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// A token that never expires (static cloud tokens).
    pub fn non_expiring(token: SecretString) -> Self {
        Self {
            token: Some(token),
            expires_at: DateTime::<Utc>::MAX_UTC,
        }
    }

    /// A token valid until `expires_at`.
    pub fn new(token: SecretString, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: Some(token),
            expires_at,
        }
    }

    /// A token issued at `now` and valid for `ttl`.
    pub fn issued(token: SecretString, now: DateTime<Utc>, ttl: TimeDelta) -> Self {
        Self::new(token, now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC))
    }

    pub fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether a refresh must run before the token can be used at `now`.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        if self.token.is_none() {
            return true;
        }
        match now.checked_add_signed(CLOCK_SKEW_MARGIN) {
            Some(deadline) => deadline >= self.expires_at,
            None => true,
        }
    }
}

/// Shared slot holding the current [`TokenState`].
///
/// Writes replace the whole state, so readers never observe a token paired
/// with another token's expiry. Concurrent refreshes are not serialized;
/// the last one to finish wins.
#[derive(Debug, Default)]
pub(crate) struct TokenCell(RwLock<TokenState>);

impl TokenCell {
    pub(crate) fn new(state: TokenState) -> Self {
        Self(RwLock::new(state))
    }

    pub(crate) fn snapshot(&self) -> TokenState {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn replace(&self, state: TokenState) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    pub(crate) fn clear(&self) {
        self.replace(TokenState::empty());
    }
}

/// Local gateway login credentials.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<SecretString>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
