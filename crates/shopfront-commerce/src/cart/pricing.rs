//! Cart pricing calculations.

use crate::cart::{AppliedCoupon, CartManager};
use crate::money::Money;
use crate::settings::AppSettings;
use serde::{Deserialize, Serialize};

/// Pricing breakdown shown on the cart page and charged at checkout.
///
/// Delivery is free once the pre-discount subtotal reaches the store's
/// free-shipping threshold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartPricing {
    /// Sum of line totals.
    pub subtotal: Money,
    /// Coupon discount, never more than the subtotal.
    pub discount: Money,
    /// Delivery fee owed.
    pub delivery_fee: Money,
    /// `subtotal - discount + delivery_fee`.
    pub total: Money,
    /// Spend still needed to unlock free delivery.
    pub remaining_for_free_shipping: Money,
}

impl CartPricing {
    /// Price a cart under the given settings and optional coupon.
    pub fn calculate(
        cart: &CartManager,
        settings: &AppSettings,
        coupon: Option<&AppliedCoupon>,
    ) -> Self {
        Self::for_subtotal(cart.total_amount(), settings, coupon)
    }

    /// Price an arbitrary subtotal.
    pub fn for_subtotal(
        subtotal: Money,
        settings: &AppSettings,
        coupon: Option<&AppliedCoupon>,
    ) -> Self {
        let discount = coupon
            .map(|c| c.value.calculate(&subtotal))
            .unwrap_or_else(|| Money::zero(subtotal.currency));
        let delivery_fee = settings.delivery_fee_for(&subtotal);
        let total = subtotal
            .amount_minor
            .saturating_sub(discount.amount_minor)
            .saturating_add(delivery_fee.amount_minor);

        Self {
            subtotal,
            discount,
            delivery_fee,
            total: Money::new(total, subtotal.currency),
            remaining_for_free_shipping: settings.remaining_for_free_shipping(&subtotal),
        }
    }

    /// Whether delivery is free.
    pub fn has_free_delivery(&self) -> bool {
        self.delivery_fee.is_zero()
    }

    /// Check if a discount is applied.
    pub fn has_discount(&self) -> bool {
        self.discount.is_positive()
    }
}
