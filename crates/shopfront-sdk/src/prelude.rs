//! Prelude for convenient imports.
//!
//! ```rust
//! use shopfront_sdk::prelude::*;
//! ```
//!
//! Brings in the store, the commerce prelude and the auth types a front end
//! touches directly.

pub use crate::{ShopError, ShopStore};

pub use shopfront_commerce::prelude::*;

pub use shopfront_auth::{AccountDirectory, AuthError, AuthSession, Credentials, Role, User};

pub use shopfront_cache::SessionId;
