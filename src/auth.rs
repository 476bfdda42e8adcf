//! Admin authentication
//!
//! Credentials are checked by an [`Authenticator`]; a successful login yields
//! a bearer [`Session`] held server-side in a [`SessionStore`]. Admin
//! endpoints validate the token on every request.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AuthConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// An issued bearer session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("admin login is not configured")]
    NotConfigured,
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid or revoked session")]
    InvalidToken,
    #[error("session expired")]
    Expired,
}

// ============================================================================
// Credential Verification
// ============================================================================

/// Pluggable credential check.
pub trait Authenticator: Send + Sync {
    fn verify(&self, credentials: &Credentials) -> Result<(), AuthError>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Single admin account from configuration.
pub struct StaticCredentialAuthenticator {
    username: String,
    password: String,
}

impl StaticCredentialAuthenticator {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.admin_username.clone(), config.admin_password.clone())
    }

    pub fn is_configured(&self) -> bool {
        !self.password.is_empty()
    }
}

impl Authenticator for StaticCredentialAuthenticator {
    fn verify(&self, credentials: &Credentials) -> Result<(), AuthError> {
        if !self.is_configured() {
            return Err(AuthError::NotConfigured);
        }
        // Evaluate both so timing does not reveal which one was wrong.
        let user_ok = constant_time_eq(credentials.username.as_bytes(), self.username.as_bytes());
        let pass_ok = constant_time_eq(credentials.password.as_bytes(), self.password.as_bytes());
        if user_ok & pass_ok {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Length-independent byte comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let len = a.len().max(b.len());
    let mut diff = a.len() ^ b.len();
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= usize::from(x ^ y);
    }
    diff == 0
}

// ============================================================================
// Sessions
// ============================================================================

/// Live sessions keyed by token.
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    pub fn issue(&self, username: &str, now: DateTime<Utc>) -> Session {
        let session = Session {
            token: uuid::Uuid::new_v4().simple().to_string(),
            username: username.to_string(),
            expires_at: now
                .checked_add_signed(self.ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        self.sessions.insert(session.token.clone(), session.clone());
        session
    }

    /// Look up a live session. Expired sessions are dropped on sight.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Session, AuthError> {
        let session = self
            .sessions
            .get(token)
            .map(|entry| entry.value().clone())
            .ok_or(AuthError::InvalidToken)?;

        if session.is_expired(now) {
            self.sessions.remove(token);
            return Err(AuthError::Expired);
        }
        Ok(session)
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Drop every expired session, returning how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_expired(now));
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// ============================================================================
// Service
// ============================================================================

/// Login, token validation and logout.
#[derive(Clone)]
pub struct AuthService {
    authenticator: Arc<dyn Authenticator>,
    sessions: Arc<SessionStore>,
}

impl AuthService {
    pub fn new(authenticator: Arc<dyn Authenticator>, sessions: Arc<SessionStore>) -> Self {
        Self {
            authenticator,
            sessions,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        let ttl = i64::try_from(config.session_ttl_minutes)
            .ok()
            .and_then(Duration::try_minutes)
            .unwrap_or_else(|| Duration::days(365));
        Self::new(
            Arc::new(StaticCredentialAuthenticator::from_config(config)),
            Arc::new(SessionStore::new(ttl)),
        )
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Verify credentials and open a session.
    pub fn authenticate(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        match self.authenticator.verify(credentials) {
            Ok(()) => {
                let session = self.sessions.issue(&credentials.username, Utc::now());
                tracing::info!(
                    user = %session.username,
                    expires_at = %session.expires_at,
                    "Admin login"
                );
                Ok(session)
            }
            Err(e) => {
                tracing::warn!(
                    user = %credentials.username,
                    backend = self.authenticator.name(),
                    error = %e,
                    "Admin login rejected"
                );
                Err(e)
            }
        }
    }

    pub fn validate(&self, token: &str) -> Result<Session, AuthError> {
        self.sessions.validate(token, Utc::now())
    }

    pub fn logout(&self, token: &str) -> bool {
        let revoked = self.sessions.revoke(token);
        if revoked {
            tracing::info!("Admin session revoked");
        }
        revoked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(u: &str, p: &str) -> Credentials {
        Credentials {
            username: u.to_string(),
            password: p.to_string(),
        }
    }

    fn service(password: &str) -> AuthService {
        AuthService::from_config(&AuthConfig {
            admin_password: password.to_string(),
            ..AuthConfig::default()
        })
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secret!"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_login_issues_validating_session() {
        let auth = service("hunter2");
        let session = auth.authenticate(&creds("admin", "hunter2")).unwrap();
        assert_eq!(session.username, "admin");
        assert!(session.expires_at > Utc::now());
        assert_eq!(auth.validate(&session.token).unwrap(), session);
    }

    #[test]
    fn test_bad_credentials_rejected() {
        let auth = service("hunter2");
        assert_eq!(
            auth.authenticate(&creds("admin", "wrong")),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            auth.authenticate(&creds("root", "hunter2")),
            Err(AuthError::InvalidCredentials)
        );
        assert!(auth.sessions().is_empty());
    }

    #[test]
    fn test_unconfigured_password_disables_login() {
        let auth = service("");
        assert_eq!(
            auth.authenticate(&creds("admin", "")),
            Err(AuthError::NotConfigured)
        );
    }

    #[test]
    fn test_logout_revokes() {
        let auth = service("pw");
        let session = auth.authenticate(&creds("admin", "pw")).unwrap();
        assert!(auth.logout(&session.token));
        assert_eq!(auth.validate(&session.token), Err(AuthError::InvalidToken));
        assert!(!auth.logout(&session.token));
    }

    #[test]
    fn test_session_expiry() {
        let store = SessionStore::new(Duration::minutes(30));
        let now = Utc::now();
        let session = store.issue("admin", now);

        assert!(store.validate(&session.token, now + Duration::minutes(29)).is_ok());
        assert_eq!(
            store.validate(&session.token, now + Duration::minutes(30)),
            Err(AuthError::Expired)
        );
        // Expired sessions are removed once seen.
        assert!(store.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let store = SessionStore::new(Duration::minutes(10));
        let now = Utc::now();
        store.issue("a", now - Duration::minutes(20));
        store.issue("b", now);
        assert_eq!(store.purge_expired(now), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unknown_token() {
        let auth = service("pw");
        assert_eq!(auth.validate("nope"), Err(AuthError::InvalidToken));
    }
}
