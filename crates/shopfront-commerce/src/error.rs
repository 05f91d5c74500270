//! Commerce error types.

use thiserror::Error;

/// Errors that can occur in shop domain operations.
#[derive(Error, Debug)]
pub enum CommerceError {
    /// Product not found in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Item not in cart.
    #[error("Item not in cart: {0}")]
    ItemNotInCart(String),

    /// Product has no stock at all.
    #[error("Out of stock: {0}")]
    OutOfStock(String),

    /// Invalid quantity.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Compare list already holds the maximum number of products.
    #[error("Compare list is full ({capacity} products)")]
    CompareFull { capacity: usize },

    /// Product already in the compare list.
    #[error("Already in compare list: {0}")]
    AlreadyInCompare(String),

    /// Coupon code unknown or inactive.
    #[error("Invalid coupon code: {0}")]
    InvalidCoupon(String),

    /// Invalid checkout state transition.
    #[error("Invalid checkout transition from {from} to {to}")]
    InvalidCheckoutTransition { from: String, to: String },

    /// Checkout step is missing required fields.
    #[error("Checkout incomplete: missing {0}")]
    CheckoutIncomplete(String),

    /// Payment method switched off in settings.
    #[error("Payment method disabled: {0}")]
    PaymentMethodDisabled(String),

    /// Checkout attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// A gateway hand-off is already outstanding.
    #[error("Payment already in progress for {0}")]
    HandoffInProgress(String),

    /// Gateway returned something that cannot become an order.
    #[error("Invalid gateway return: {0}")]
    InvalidGatewayReturn(String),

    /// Review summary collaborator failed or timed out.
    #[error("Review summary unavailable: {0}")]
    SummaryUnavailable(String),

    /// Currency mismatch.
    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: String, got: String },

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,

    /// Settings could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session store error.
    #[error("Cache error: {0}")]
    Cache(#[from] shopfront_cache::CacheError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl CommerceError {
    /// Whether the condition is resolved where it is detected and only
    /// needs to be surfaced to the shopper.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CommerceError::OutOfStock(_)
                | CommerceError::InvalidQuantity(_)
                | CommerceError::CompareFull { .. }
                | CommerceError::AlreadyInCompare(_)
                | CommerceError::InvalidCoupon(_)
                | CommerceError::CheckoutIncomplete(_)
                | CommerceError::PaymentMethodDisabled(_)
                | CommerceError::EmptyCart
                | CommerceError::HandoffInProgress(_)
                | CommerceError::InvalidGatewayReturn(_)
                | CommerceError::SummaryUnavailable(_)
        )
    }
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::SerializationError(e.to_string())
    }
}

impl From<toml::de::Error> for CommerceError {
    fn from(e: toml::de::Error) -> Self {
        CommerceError::Config(e.to_string())
    }
}
