//! Authentication for Shopfront.
//!
//! Provides shopper accounts, Argon2 password hashing, the login session and
//! a client-side role gate.
//!
//! ```rust
//! use shopfront_auth::{AccountDirectory, AuthSession, Credentials, PasswordHasher, Role};
//!
//! let mut directory = AccountDirectory::new(PasswordHasher::with_cost(1024, 1).unwrap());
//! let creds = Credentials::new("sara@example.com", "Secret123");
//! directory.register("Sara", &creds, Role::Customer).unwrap();
//!
//! let mut session = AuthSession::new();
//! session.login(&mut directory, &creds).unwrap();
//! assert!(session.require_role(Role::Admin).is_err());
//! ```

mod directory;
mod error;
mod password;
mod session;
mod user;

pub use directory::{AccountDirectory, DEFAULT_LOCKOUT, DEFAULT_MAX_FAILED_ATTEMPTS};
pub use error::AuthError;
pub use password::{PasswordHasher, MIN_PASSWORD_LENGTH};
pub use session::AuthSession;
pub use user::{Credentials, Role, SavedAddress, User, UserCredentials};
