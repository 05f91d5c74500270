//! Shop domain state for Shopfront.
//!
//! This crate holds the in-memory model of one shopping session:
//!
//! - **Catalog**: read-only product list with a live search term
//! - **Cart**: stock-aware cart lines, pricing and coupons
//! - **Lists**: wishlist, compare list, recently viewed
//! - **Notifications**: single-slot transient messages
//! - **Checkout**: multi-step state machine, gateway hand-off, reconciliation
//!   and the order ledger
//! - **Summary**: AI review digest collaborator
//!
//! # Example
//!
//! ```rust
//! use shopfront_commerce::prelude::*;
//!
//! let settings = AppSettings::default();
//! let phone = Product::new("p1", "Galaxy S24", Money::from_major(390, Currency::KWD), 3);
//!
//! let mut cart = CartManager::new(settings.currency);
//! let update = cart.add_to_cart(&phone, 5).unwrap();
//! assert_eq!(update.quantity, 3);
//! assert!(update.stock_exceeded.is_some());
//!
//! let pricing = CartPricing::calculate(&cart, &settings, None);
//! assert_eq!(pricing.total.display(), "KD 1170.000");
//! ```

pub mod error;
pub mod ids;
pub mod money;
pub mod settings;

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod lists;
pub mod notify;
pub mod summary;

pub use error::CommerceError;
pub use ids::*;
pub use money::{Currency, Money};
pub use settings::AppSettings;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};
    pub use crate::settings::{AppSettings, PaymentToggles};

    // Catalog
    pub use crate::catalog::{CatalogView, ColorVariant, Product};

    // Cart
    pub use crate::cart::{
        AppliedCoupon, CartLine, CartManager, CartPricing, CartUpdate, Coupon, CouponValue,
        StockExceeded,
    };

    // Lists
    pub use crate::lists::{CompareList, RecentlyViewed, Wishlist, COMPARE_CAPACITY};

    // Notifications
    pub use crate::notify::{Notification, NotificationHandle, NotificationQueue, Severity};

    // Checkout
    pub use crate::checkout::{
        Address, CheckoutCoordinator, CheckoutStep, CheckoutTicket, CustomerSnapshot,
        GatewayRequest, GatewayResult, GatewayStatus, Order, OrderLedger, OrderLine,
        OrderStatus, PaymentGateway, PaymentMethod, ReconcileOutcome, SimulatedGateway,
        SimulatedOutcome,
    };

    // Summary
    pub use crate::summary::{ReviewSummaries, ReviewSummarizer, SummaryState};
}
