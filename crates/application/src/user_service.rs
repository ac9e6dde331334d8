//! User lookup ports and the sign-in service.
//!
//! Sign-in consults the [`LoginAttemptGuard`] before any credential work and
//! clears it after a verified success. Every failure collapses into one
//! generic outcome so callers cannot tell unknown users from bad passwords.

use std::sync::Arc;

use async_trait::async_trait;

use gatehouse_core::{AppResult, UserIdentity, UserRole};
use gatehouse_domain::UserId;

use crate::LoginAttemptGuard;

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// User record returned by repository queries.
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// Unique user identifier.
    pub id: UserId,
    /// Username as stored.
    pub username: String,
    /// Argon2id password hash.
    pub password_hash: String,
    /// Site role.
    pub role: UserRole,
    /// Whether moderation has disabled the account.
    pub banned: bool,
}

impl UserRecord {
    /// Returns the session identity for this user.
    #[must_use]
    pub fn identity(&self) -> UserIdentity {
        UserIdentity::new(self.id.to_string(), self.username.clone(), self.role)
    }
}

/// Repository port for user lookups.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by username (case-insensitive).
    async fn find_by_username(&self, username: &str) -> AppResult<Option<UserRecord>>;
}

/// Port for password hashing operations.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool>;
}

// ---------------------------------------------------------------------------
// Authentication outcome
// ---------------------------------------------------------------------------

/// Result of a login attempt.
#[derive(Debug)]
pub enum AuthOutcome {
    /// Credentials verified. A session can be established.
    Authenticated(UserRecord),
    /// The address is locked out. Credentials were not checked.
    Throttled,
    /// Authentication failed. Generic to prevent enumeration.
    Failed,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Application service for user sign-in.
#[derive(Clone)]
pub struct UserService {
    user_repository: Arc<dyn UserRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
    login_guard: LoginAttemptGuard,
}

impl UserService {
    /// Creates a new user service.
    #[must_use]
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
        login_guard: LoginAttemptGuard,
    ) -> Self {
        Self {
            user_repository,
            password_hasher,
            login_guard,
        }
    }
}

mod login;

#[cfg(test)]
mod tests;
