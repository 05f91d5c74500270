//! Process-wide store settings.
//!
//! Settings are read once (usually from `shop.toml`) and shared read-only
//! behind an `Arc` for the lifetime of the process.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cart::Coupon;
use crate::checkout::PaymentMethod;
use crate::money::{Currency, Money};
use crate::CommerceError;

/// Default number of recently viewed products kept.
pub const DEFAULT_RECENTLY_VIEWED_LIMIT: usize = 8;

/// Default notification lifetime.
pub const DEFAULT_NOTIFICATION_MS: u64 = 3000;

/// Default lifetime of a checkout ticket in the session store.
pub const DEFAULT_TICKET_TTL_SECS: u64 = 30 * 60;

/// Validated store settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AppSettings {
    /// Store display name.
    pub store_name: String,
    /// Currency every price is expressed in.
    pub currency: Currency,
    /// Flat delivery fee charged below the free-shipping threshold.
    pub delivery_fee: Money,
    /// Subtotal at or above which delivery is free.
    pub free_shipping_threshold: Money,
    /// Which payment methods may be selected.
    pub payments: PaymentToggles,
    /// Redeemable coupon codes.
    pub coupons: Vec<Coupon>,
    /// Cap on the recently viewed list.
    pub recently_viewed_limit: usize,
    /// How long a notification stays visible.
    pub notification_duration: Duration,
    /// How long a checkout ticket survives in the session store.
    pub checkout_ticket_ttl: Duration,
}

/// Payment method switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentToggles {
    /// Accept KNET debit.
    #[serde(default = "default_true")]
    pub knet_enabled: bool,
    /// Accept credit cards.
    #[serde(default = "default_true")]
    pub card_enabled: bool,
}

impl Default for PaymentToggles {
    fn default() -> Self {
        Self {
            knet_enabled: true,
            card_enabled: true,
        }
    }
}

impl AppSettings {
    /// Parse and validate settings from TOML.
    pub fn from_toml_str(content: &str) -> Result<Self, CommerceError> {
        let file: SettingsFile = toml::from_str(content)?;
        file.validate()
    }

    /// Parse and validate settings from JSON.
    pub fn from_json_str(content: &str) -> Result<Self, CommerceError> {
        let file: SettingsFile = serde_json::from_str(content)
            .map_err(|e| CommerceError::Config(e.to_string()))?;
        file.validate()
    }

    /// Whether a payment method is switched on.
    pub fn is_payment_enabled(&self, method: PaymentMethod) -> bool {
        match method {
            PaymentMethod::Knet => self.payments.knet_enabled,
            PaymentMethod::CreditCard => self.payments.card_enabled,
        }
    }

    /// Payment methods currently selectable, in display order.
    pub fn enabled_payment_methods(&self) -> Vec<PaymentMethod> {
        PaymentMethod::ALL
            .into_iter()
            .filter(|method| self.is_payment_enabled(*method))
            .collect()
    }

    /// Delivery fee owed for a given subtotal.
    pub fn delivery_fee_for(&self, subtotal: &Money) -> Money {
        if subtotal.amount_minor >= self.free_shipping_threshold.amount_minor {
            Money::zero(self.currency)
        } else {
            self.delivery_fee
        }
    }

    /// How much more must be spent before delivery is free.
    pub fn remaining_for_free_shipping(&self, subtotal: &Money) -> Money {
        let remaining = (self.free_shipping_threshold.amount_minor - subtotal.amount_minor).max(0);
        Money::new(remaining, self.currency)
    }

    /// Look up a coupon by code (case-insensitive).
    pub fn find_coupon(&self, code: &str) -> Option<&Coupon> {
        let code = code.trim();
        self.coupons
            .iter()
            .find(|coupon| coupon.code.eq_ignore_ascii_case(code))
    }

    /// Convert back to the on-disk representation.
    pub fn to_file(&self) -> SettingsFile {
        SettingsFile {
            store_name: self.store_name.clone(),
            currency: self.currency.code().to_string(),
            delivery_fee: self.delivery_fee.to_decimal(),
            free_shipping_threshold: self.free_shipping_threshold.to_decimal(),
            payments: self.payments,
            coupons: self.coupons.clone(),
            recently_viewed_limit: self.recently_viewed_limit,
            notification_ms: self.notification_duration.as_millis() as u64,
            checkout_ticket_ttl_secs: self.checkout_ticket_ttl.as_secs(),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        let currency = Currency::KWD;
        Self {
            store_name: default_store_name(),
            currency,
            delivery_fee: Money::from_decimal(default_delivery_fee(), currency),
            free_shipping_threshold: Money::from_decimal(default_free_shipping(), currency),
            payments: PaymentToggles::default(),
            coupons: Vec::new(),
            recently_viewed_limit: DEFAULT_RECENTLY_VIEWED_LIMIT,
            notification_duration: Duration::from_millis(DEFAULT_NOTIFICATION_MS),
            checkout_ticket_ttl: Duration::from_secs(DEFAULT_TICKET_TTL_SECS),
        }
    }
}

/// On-disk settings. Amounts are written in major units (e.g. `2.5` dinars).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsFile {
    /// Store display name.
    #[serde(default = "default_store_name")]
    pub store_name: String,

    /// ISO currency code.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Delivery fee in major units.
    #[serde(default = "default_delivery_fee")]
    pub delivery_fee: f64,

    /// Free-shipping threshold in major units.
    #[serde(default = "default_free_shipping")]
    pub free_shipping_threshold: f64,

    /// Payment toggles.
    #[serde(default)]
    pub payments: PaymentToggles,

    /// Coupon table.
    #[serde(default)]
    pub coupons: Vec<Coupon>,

    /// Recently viewed cap.
    #[serde(default = "default_recently_viewed")]
    pub recently_viewed_limit: usize,

    /// Notification lifetime in milliseconds.
    #[serde(default = "default_notification_ms")]
    pub notification_ms: u64,

    /// Checkout ticket lifetime in seconds.
    #[serde(default = "default_ticket_ttl")]
    pub checkout_ticket_ttl_secs: u64,
}

impl SettingsFile {
    /// Validate and convert into typed settings.
    pub fn validate(self) -> Result<AppSettings, CommerceError> {
        let currency = Currency::from_code(&self.currency)
            .ok_or_else(|| CommerceError::Config(format!("unknown currency {}", self.currency)))?;

        if !self.delivery_fee.is_finite() || self.delivery_fee < 0.0 {
            return Err(CommerceError::Config(
                "delivery_fee must be a non-negative amount".to_string(),
            ));
        }
        if !self.free_shipping_threshold.is_finite() || self.free_shipping_threshold < 0.0 {
            return Err(CommerceError::Config(
                "free_shipping_threshold must be a non-negative amount".to_string(),
            ));
        }
        if self.recently_viewed_limit == 0 {
            return Err(CommerceError::Config(
                "recently_viewed_limit must be at least 1".to_string(),
            ));
        }
        for coupon in &self.coupons {
            coupon.validate()?;
        }

        Ok(AppSettings {
            store_name: self.store_name,
            currency,
            delivery_fee: Money::from_decimal(self.delivery_fee, currency),
            free_shipping_threshold: Money::from_decimal(self.free_shipping_threshold, currency),
            payments: self.payments,
            coupons: self.coupons,
            recently_viewed_limit: self.recently_viewed_limit,
            notification_duration: Duration::from_millis(self.notification_ms),
            checkout_ticket_ttl: Duration::from_secs(self.checkout_ticket_ttl_secs),
        })
    }
}

impl Default for SettingsFile {
    fn default() -> Self {
        AppSettings::default().to_file()
    }
}

fn default_store_name() -> String {
    "Shopfront".to_string()
}

fn default_currency() -> String {
    Currency::KWD.code().to_string()
}

fn default_delivery_fee() -> f64 {
    2.0
}

fn default_free_shipping() -> f64 {
    50.0
}

fn default_recently_viewed() -> usize {
    DEFAULT_RECENTLY_VIEWED_LIMIT
}

fn default_notification_ms() -> u64 {
    DEFAULT_NOTIFICATION_MS
}

fn default_ticket_ttl() -> u64 {
    DEFAULT_TICKET_TTL_SECS
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CouponValue;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let settings = AppSettings::from_toml_str("").unwrap();
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.currency, Currency::KWD);
        assert_eq!(settings.delivery_fee.amount_minor, 2000);
    }

    #[test]
    fn test_parse_full_toml() {
        let settings = AppSettings::from_toml_str(
            r#"
            store_name = "Souq"
            currency = "KWD"
            delivery_fee = 1.5
            free_shipping_threshold = 800
            recently_viewed_limit = 5

            [payments]
            knet_enabled = true
            card_enabled = false

            [[coupons]]
            code = "WELCOME10"
            value = { kind = "percentage", value = 10.0 }
            "#,
        )
        .unwrap();

        assert_eq!(settings.store_name, "Souq");
        assert_eq!(settings.delivery_fee.amount_minor, 1500);
        assert_eq!(settings.free_shipping_threshold, Money::from_major(800, Currency::KWD));
        assert_eq!(settings.recently_viewed_limit, 5);
        assert_eq!(settings.enabled_payment_methods(), vec![PaymentMethod::Knet]);
        assert_eq!(
            settings.find_coupon("welcome10").map(|c| &c.value),
            Some(&CouponValue::Percentage(10.0))
        );
    }

    #[test]
    fn test_rejects_unknown_currency() {
        let result = AppSettings::from_toml_str(r#"currency = "XYZ""#);
        assert!(matches!(result, Err(CommerceError::Config(_))));
    }

    #[test]
    fn test_rejects_negative_fee() {
        let result = AppSettings::from_toml_str("delivery_fee = -1.0");
        assert!(matches!(result, Err(CommerceError::Config(_))));
    }

    #[test]
    fn test_delivery_fee_waived_at_threshold() {
        let mut settings = AppSettings::default();
        settings.free_shipping_threshold = Money::from_major(800, Currency::KWD);

        let below = Money::from_major(780, Currency::KWD);
        let at = Money::from_major(800, Currency::KWD);

        assert_eq!(settings.delivery_fee_for(&below), settings.delivery_fee);
        assert!(settings.delivery_fee_for(&at).is_zero());
        assert_eq!(
            settings.remaining_for_free_shipping(&below),
            Money::from_major(20, Currency::KWD)
        );
        assert!(settings.remaining_for_free_shipping(&at).is_zero());
    }

    #[test]
    fn test_round_trip_through_file() {
        let settings = AppSettings::default();
        let file = settings.to_file();
        assert_eq!(file.validate().unwrap(), settings);
    }

    #[test]
    fn test_json_settings() {
        let settings = AppSettings::from_json_str(r#"{"currency":"USD","delivery_fee":5}"#).unwrap();
        assert_eq!(settings.currency, Currency::USD);
        assert_eq!(settings.delivery_fee.amount_minor, 500);
    }
}
