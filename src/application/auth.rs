//! Registration, login, and the in-process session table.
//!
//! Passwords are stored as `salt$sha256(salt + password)` and compared in
//! constant time. Sessions are opaque random tokens mapped to the signed-in
//! user; the token travels in an HttpOnly cookie.

use std::sync::Arc;

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{RepoError, UsersRepo};
use crate::domain::forms::SignupDraft;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username is already taken")]
    UsernameTaken,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// The authenticated identity carried through a request.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UsersRepo>,
    sessions: Arc<DashMap<String, SessionUser>>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UsersRepo>) -> Self {
        Self {
            users,
            sessions: Arc::new(DashMap::new()),
        }
    }

    /// Create an account and immediately start a session for it.
    pub async fn register(&self, draft: SignupDraft) -> Result<(SessionUser, String), AuthError> {
        if self
            .users
            .find_user_by_username(&draft.username)
            .await?
            .is_some()
        {
            return Err(AuthError::UsernameTaken);
        }

        let hash = hash_password(&draft.password);
        let user = self
            .users
            .insert_user(&draft.username, &hash, OffsetDateTime::now_utc())
            .await
            .map_err(|err| match err {
                RepoError::Duplicate => AuthError::UsernameTaken,
                other => AuthError::Repo(other),
            })?;

        info!(target = "brusio::auth", username = %user.username, "account created");
        let session_user = SessionUser {
            id: user.id,
            username: user.username,
        };
        let token = self.start_session(session_user.clone());
        Ok((session_user, token))
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let user = self
            .users
            .find_user_by_username(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&user.password_hash, password) {
            return Err(AuthError::InvalidCredentials);
        }

        info!(target = "brusio::auth", username = %user.username, "login");
        Ok(self.start_session(SessionUser {
            id: user.id,
            username: user.username,
        }))
    }

    pub fn session(&self, token: &str) -> Option<SessionUser> {
        self.sessions.get(token).map(|entry| entry.value().clone())
    }

    pub fn logout(&self, token: &str) {
        self.sessions.remove(token);
    }

    fn start_session(&self, user: SessionUser) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.sessions.insert(token.clone(), user);
        token
    }
}

fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{salt}${}", digest_hex(&salt, password))
}

fn verify_password(stored: &str, password: &str) -> bool {
    let Some((salt, expected)) = stored.split_once('$') else {
        return false;
    };
    let computed = digest_hex(salt, password);
    computed.as_bytes().ct_eq(expected.as_bytes()).unwrap_u8() == 1
}

fn digest_hex(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip_verifies() {
        let hash = hash_password("correct horse battery");
        assert!(verify_password(&hash, "correct horse battery"));
        assert!(!verify_password(&hash, "correct horse battery!"));
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash_password("same password");
        let second = hash_password("same password");
        assert_ne!(first, second);
        assert!(verify_password(&first, "same password"));
        assert!(verify_password(&second, "same password"));
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("no-dollar-separator", "anything"));
        assert!(!verify_password("", "anything"));
    }
}
