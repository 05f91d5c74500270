//! Shipping contact and address captured during checkout.

use serde::{Deserialize, Serialize};

/// Kuwait-style delivery address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub area: String,
    pub block: String,
    pub street: String,
    pub building: String,
    /// Floor, apartment or delivery notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Address {
    /// Required fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("area", &self.area),
            ("block", &self.block),
            ("street", &self.street),
            ("building", &self.building),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// Check if address has all required fields.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Format as a single line.
    pub fn one_line(&self) -> String {
        let mut line = format!(
            "{}, Block {}, Street {}, Building {}",
            self.area, self.block, self.street, self.building
        );
        if let Some(notes) = self.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            line.push_str(" (");
            line.push_str(notes);
            line.push(')');
        }
        line
    }
}

/// Customer contact and address as entered at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: Address,
}

impl CustomerSnapshot {
    /// Every required field that is blank or malformed.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.full_name.trim().is_empty() {
            missing.push("full name");
        }
        if !looks_like_email(&self.email) {
            missing.push("email");
        }
        if self.phone.chars().filter(char::is_ascii_digit).count() < 8 {
            missing.push("phone");
        }
        missing.extend(self.address.missing_fields());
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

fn looks_like_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}
