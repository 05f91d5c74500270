//! Coupon codes.

use crate::money::Money;
use crate::CommerceError;
use serde::{Deserialize, Serialize};

/// Value of a coupon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CouponValue {
    /// Percentage off the subtotal (0.0 - 100.0).
    Percentage(f64),
    /// Fixed amount off, in major units of the store currency.
    Fixed(f64),
}

impl CouponValue {
    /// Calculate the discount for a subtotal. Never exceeds the subtotal.
    pub fn calculate(&self, subtotal: &Money) -> Money {
        let discount = match self {
            CouponValue::Percentage(percent) => subtotal.percentage(*percent),
            CouponValue::Fixed(amount) => Money::from_decimal(*amount, subtotal.currency),
        };
        if discount.amount_minor > subtotal.amount_minor {
            *subtotal
        } else {
            discount
        }
    }
}

/// A redeemable coupon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Coupon {
    /// Code the shopper types (matched case-insensitively).
    pub code: String,
    /// Short description shown once applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Discount granted.
    pub value: CouponValue,
}

impl Coupon {
    /// Create a percentage coupon.
    pub fn percentage(code: impl Into<String>, percent: f64) -> Self {
        Self {
            code: code.into(),
            description: None,
            value: CouponValue::Percentage(percent),
        }
    }

    /// Create a fixed-amount coupon.
    pub fn fixed(code: impl Into<String>, amount: f64) -> Self {
        Self {
            code: code.into(),
            description: None,
            value: CouponValue::Fixed(amount),
        }
    }

    /// Reject malformed coupon definitions.
    pub fn validate(&self) -> Result<(), CommerceError> {
        if self.code.trim().is_empty() {
            return Err(CommerceError::Config("coupon code must not be empty".to_string()));
        }
        let ok = match self.value {
            CouponValue::Percentage(percent) => (0.0..=100.0).contains(&percent),
            CouponValue::Fixed(amount) => amount.is_finite() && amount >= 0.0,
        };
        if ok {
            Ok(())
        } else {
            Err(CommerceError::Config(format!(
                "coupon {} has an out-of-range value",
                self.code
            )))
        }
    }
}

/// A coupon accepted for the current checkout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppliedCoupon {
    /// Normalized (upper-case) code.
    pub code: String,
    /// Discount definition.
    pub value: CouponValue,
}

impl From<&Coupon> for AppliedCoupon {
    fn from(coupon: &Coupon) -> Self {
        Self {
            code: coupon.code.trim().to_uppercase(),
            value: coupon.value.clone(),
        }
    }
}
