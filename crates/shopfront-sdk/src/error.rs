//! Store-level error type.

use shopfront_auth::AuthError;
use shopfront_commerce::CommerceError;
use thiserror::Error;

/// Errors surfaced by [`ShopStore`](crate::ShopStore) operations that span crates.
#[derive(Error, Debug)]
pub enum ShopError {
    #[error(transparent)]
    Commerce(#[from] CommerceError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ShopError {
    /// Whether the shopper can fix this and try again.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ShopError::Commerce(e) => e.is_recoverable(),
            ShopError::Auth(e) => e.is_auth_failure() || e.is_permission_error(),
        }
    }
}
