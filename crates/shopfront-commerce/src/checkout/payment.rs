//! Payment methods offered at checkout.

use serde::{Deserialize, Serialize};

/// How the shopper pays at the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// KNET debit card.
    Knet,
    /// Visa / Mastercard.
    CreditCard,
}

impl PaymentMethod {
    /// Every method, in display order.
    pub const ALL: [PaymentMethod; 2] = [PaymentMethod::Knet, PaymentMethod::CreditCard];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Knet => "knet",
            PaymentMethod::CreditCard => "credit_card",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentMethod::Knet => "KNET",
            PaymentMethod::CreditCard => "Credit Card",
        }
    }

    /// Parse from the wire name.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "knet" => Some(PaymentMethod::Knet),
            "credit_card" | "card" | "creditcard" => Some(PaymentMethod::CreditCard),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(PaymentMethod::parse("KNET"), Some(PaymentMethod::Knet));
        assert_eq!(PaymentMethod::parse("card"), Some(PaymentMethod::CreditCard));
        assert_eq!(PaymentMethod::parse("cash"), None);
    }

    #[test]
    fn test_serde_name_matches_as_str() {
        for method in PaymentMethod::ALL {
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json, format!("\"{}\"", method.as_str()));
        }
    }
}
