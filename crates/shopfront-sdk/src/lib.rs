//! # Shopfront SDK
//!
//! One store object per shopping session, tying together the catalog, cart,
//! saved lists, sign-in, notifications and checkout.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use shopfront_sdk::prelude::*;
//!
//! let catalog = CatalogView::new(vec![
//!     Product::new("p1", "Galaxy S24", Money::from_major(390, Currency::KWD), 3),
//! ]);
//! let mut store = ShopStore::new(Arc::new(AppSettings::default()), catalog);
//!
//! let update = store.add_to_cart(&ProductId::new("p1"), 5).unwrap();
//! assert_eq!(update.quantity, 3);
//! assert_eq!(
//!     store.notifications().current().map(|n| n.severity),
//!     Some(Severity::Error)
//! );
//! ```
//!
//! ## Layers
//!
//! - [`shopfront_cache`] for session-scoped storage with expiry
//! - [`shopfront_commerce`] for the shop domain managers
//! - [`shopfront_auth`] for accounts and the login session
//!
//! [`ShopStore`] is the only place where manager results become
//! shopper-facing notifications.

mod error;
mod store;

pub mod prelude;

// Re-export the layer crates
pub use shopfront_auth;
pub use shopfront_cache;
pub use shopfront_commerce;

pub use error::ShopError;
pub use store::ShopStore;
