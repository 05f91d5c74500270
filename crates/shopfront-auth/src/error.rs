//! Authentication errors.

use crate::user::Role;
use thiserror::Error;

/// Authentication error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Invalid credentials provided.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// User already exists.
    #[error("user already exists: {0}")]
    UserAlreadyExists(String),

    /// Email address is malformed.
    #[error("invalid email: {0}")]
    InvalidEmail(String),

    /// Password too weak.
    #[error("password too weak: {0}")]
    WeakPassword(String),

    /// Too many failed attempts.
    #[error("account locked, try again later")]
    AccountLocked {
        /// Unix millis when the lock lifts.
        until: i64,
    },

    /// Role name not recognised.
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// No user is signed in.
    #[error("not signed in")]
    NotSignedIn,

    /// Insufficient permissions.
    #[error("insufficient permissions: {} required", required.as_str())]
    InsufficientPermissions { required: Role },

    /// Password hashing failed.
    #[error("password hashing error: {0}")]
    Hashing(String),
}

impl AuthError {
    /// Check if this is an authentication failure.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials | AuthError::NotSignedIn | AuthError::AccountLocked { .. }
        )
    }

    /// Check if this is a permission error.
    pub fn is_permission_error(&self) -> bool {
        matches!(self, AuthError::InsufficientPermissions { .. })
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(e: argon2::password_hash::Error) -> Self {
        AuthError::Hashing(e.to_string())
    }
}
