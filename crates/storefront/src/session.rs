//! Authentication state and its durable mirror.
//!
//! A [`Session`] pairs the logged-in [`User`] with the bearer token the API
//! issued for them. The two are only ever set or cleared together, both in
//! memory and in storage.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use winkel_core::User;

use crate::persistence::{Persistence, StorageKey};

/// Errors from session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A login was attempted with a blank token.
    #[error("bearer token cannot be empty")]
    EmptyToken,

    /// The operation needs a logged-in user.
    #[error("you must be logged in")]
    NotAuthenticated,

    /// The operation needs an administrator.
    #[error("administrator access required")]
    NotAdmin,
}

/// An opaque bearer credential.
///
/// The value is kept in a [`SecretString`] so it never shows up in `Debug`
/// output or logs.
pub struct BearerToken(SecretString);

/// The subset of JWT claims this client looks at.
#[derive(Deserialize)]
struct Claims {
    exp: Option<i64>,
}

impl BearerToken {
    /// Wrap a raw token, trimming whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::EmptyToken`] if nothing is left after trimming.
    pub fn parse(raw: &str) -> Result<Self, SessionError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SessionError::EmptyToken);
        }
        Ok(Self(SecretString::from(raw.to_owned())))
    }

    /// The raw token, for an `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Expiry read from the `exp` claim if the token is a JWT.
    ///
    /// The signature is not checked; this is only used to drop sessions the
    /// server would reject anyway. Opaque tokens have no known expiry.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let payload = self.expose().split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .ok()?;
        let claims: Claims = serde_json::from_slice(&bytes).ok()?;
        DateTime::from_timestamp(claims.exp?, 0)
    }

    /// Whether the token carries an expiry at or before `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

/// An authenticated user together with their token.
#[derive(Debug)]
pub struct Session {
    user: User,
    token: BearerToken,
}

impl Session {
    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    #[must_use]
    pub const fn token(&self) -> &BearerToken {
        &self.token
    }
}

/// Owns the current [`Session`] and keeps storage in step with it.
#[derive(Debug)]
pub struct SessionManager {
    persistence: Persistence,
    current: Option<Session>,
}

impl SessionManager {
    /// A manager with no session. Storage is not read; see
    /// [`SessionManager::restore`].
    #[must_use]
    pub const fn new(persistence: Persistence) -> Self {
        Self {
            persistence,
            current: None,
        }
    }

    /// A manager initialized from whatever storage holds.
    #[must_use]
    pub fn restored(persistence: Persistence) -> Self {
        let mut manager = Self::new(persistence);
        manager.restore();
        manager
    }

    /// Re-establish the session from storage.
    ///
    /// Both the user and the token must be present and decodable, and the
    /// token must not be expired; otherwise the manager ends up logged out.
    /// Leftover halves of an incomplete session are erased. Never fails.
    pub fn restore(&mut self) {
        let user = self.persistence.load::<User>(StorageKey::User);
        let token = self
            .persistence
            .load::<String>(StorageKey::Token)
            .and_then(|raw| BearerToken::parse(&raw).ok());

        self.current = match (user, token) {
            (Some(user), Some(token)) if token.is_expired_at(Utc::now()) => {
                tracing::info!(user_id = %user.id, "persisted session has expired");
                self.erase_persisted();
                None
            }
            (Some(user), Some(token)) => {
                tracing::debug!(user_id = %user.id, "session restored");
                Some(Session { user, token })
            }
            (None, None)
                if !self.persistence.contains(StorageKey::User)
                    && !self.persistence.contains(StorageKey::Token) =>
            {
                None
            }
            _ => {
                tracing::warn!("discarding incomplete persisted session");
                self.erase_persisted();
                None
            }
        };
    }

    /// Start a session for `user` with `token`, replacing any current one.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::EmptyToken`] for a blank token; the current
    /// session is left untouched in that case.
    pub fn login(&mut self, user: User, token: &str) -> Result<&User, SessionError> {
        let token = BearerToken::parse(token)?;

        self.persistence.save(StorageKey::User, &user);
        self.persistence.save(StorageKey::Token, token.expose());
        tracing::info!(user_id = %user.id, admin = user.is_admin, "logged in");

        let session = self.current.insert(Session { user, token });
        Ok(&session.user)
    }

    /// End the session and erase it from storage. Always succeeds.
    pub fn logout(&mut self) {
        if let Some(session) = self.current.take() {
            tracing::info!(user_id = %session.user.id, "logged out");
        }
        self.erase_persisted();
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// False when logged out.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.current.as_ref().is_some_and(|s| s.user.is_admin)
    }

    #[must_use]
    pub fn current_user(&self) -> Option<&User> {
        self.current.as_ref().map(Session::user)
    }

    #[must_use]
    pub fn token(&self) -> Option<&BearerToken> {
        self.current.as_ref().map(Session::token)
    }

    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// The current session, or an error if logged out.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotAuthenticated`] without a session.
    pub fn require(&self) -> Result<&Session, SessionError> {
        self.current.as_ref().ok_or(SessionError::NotAuthenticated)
    }

    /// The current session if it belongs to an administrator.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotAuthenticated`] without a session and
    /// [`SessionError::NotAdmin`] for a regular user.
    pub fn require_admin(&self) -> Result<&Session, SessionError> {
        let session = self.require()?;
        if session.user.is_admin {
            Ok(session)
        } else {
            Err(SessionError::NotAdmin)
        }
    }

    fn erase_persisted(&self) {
        self.persistence.delete(StorageKey::User);
        self.persistence.delete(StorageKey::Token);
    }
}
