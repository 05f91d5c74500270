//! Shopping cart module.
//!
//! Contains the cart manager, pricing and coupons.

mod coupon;
mod manager;
mod pricing;

pub use coupon::{AppliedCoupon, Coupon, CouponValue};
pub use manager::{CartLine, CartManager, CartUpdate, StockExceeded};
pub use pricing::CartPricing;
