//! Session-scoped key-value store for Shopfront.
//!
//! Holds short-lived data that has to survive a hand-off outside the
//! application (for example the checkout ticket written before the payment
//! gateway takes over) with automatic JSON serialization and optional expiry.
//!
//! # Example
//!
//! ```rust
//! use shopfront_cache::{cache_key, Cache};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Ticket {
//!     reference: String,
//! }
//!
//! let mut cache = Cache::new();
//! let key = cache_key!("checkout", "ticket", "sess_1");
//!
//! cache.set(&key, &Ticket { reference: "REF-1".into() }).unwrap();
//! let ticket: Option<Ticket> = cache.get(&key).unwrap();
//! assert_eq!(ticket.unwrap().reference, "REF-1");
//!
//! cache.delete(&key);
//! ```

mod error;
mod kv;
mod session;

pub use error::CacheError;
pub use kv::Cache;
pub use session::{now_millis, SessionData, SessionId, SessionSlot};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Cache, CacheError, SessionId, SessionSlot};
}
