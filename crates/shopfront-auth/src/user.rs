//! User types.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use shopfront_commerce::checkout::{Address, CustomerSnapshot};
use shopfront_commerce::ids::{AddressId, UserId};

use crate::AuthError;

/// User role for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular customer.
    #[default]
    Customer,
    /// Store administrator.
    Admin,
}

impl Role {
    /// Get role as string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }

    /// Check if this role has at least the given permission level.
    pub fn has_permission(&self, required: Role) -> bool {
        self.level() >= required.level()
    }

    /// Get permission level (higher = more permissions).
    pub fn level(&self) -> u8 {
        match self {
            Role::Customer => 0,
            Role::Admin => 1,
        }
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            other => Err(AuthError::UnknownRole(other.to_string())),
        }
    }
}

/// An address saved on the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedAddress {
    pub id: AddressId,
    /// Short label ("Home", "Office").
    pub label: String,
    pub address: Address,
    pub is_default: bool,
}

impl SavedAddress {
    pub fn new(label: impl Into<String>, address: Address) -> Self {
        Self {
            id: AddressId::generate(),
            label: label.into(),
            address,
            is_default: false,
        }
    }
}

/// A signed-in shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub role: Role,
    #[serde(default)]
    pub addresses: Vec<SavedAddress>,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: UserId::generate(),
            name: name.into(),
            email: email.into(),
            phone: String::new(),
            role,
            addresses: Vec::new(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Check if user has at least the given permission level.
    pub fn has_permission(&self, required: Role) -> bool {
        self.role.has_permission(required)
    }

    /// The default saved address, or the first one.
    pub fn default_address(&self) -> Option<&SavedAddress> {
        self.addresses
            .iter()
            .find(|a| a.is_default)
            .or_else(|| self.addresses.first())
    }

    /// Save an address. The first address becomes the default.
    pub fn add_address(&mut self, mut address: SavedAddress) -> &SavedAddress {
        if address.is_default {
            for existing in &mut self.addresses {
                existing.is_default = false;
            }
        } else if self.addresses.is_empty() {
            address.is_default = true;
        }
        self.addresses.push(address);
        let last = self.addresses.len() - 1;
        &self.addresses[last]
    }

    /// Contact details for pre-filling checkout.
    pub fn contact_snapshot(&self) -> CustomerSnapshot {
        CustomerSnapshot {
            full_name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            address: self
                .default_address()
                .map(|saved| saved.address.clone())
                .unwrap_or_default(),
        }
    }
}

/// Email and password typed into the login form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Stored account: the user plus password hash and lockout state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCredentials {
    pub user: User,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Consecutive failed login attempts.
    pub failed_attempts: u32,
    /// Unix millis until which logins are refused.
    pub locked_until: Option<i64>,
}

impl UserCredentials {
    pub fn new(user: User, password_hash: impl Into<String>) -> Self {
        Self {
            user,
            password_hash: password_hash.into(),
            failed_attempts: 0,
            locked_until: None,
        }
    }

    /// Check if account is locked at `now` (Unix millis).
    pub fn is_locked(&self, now: i64) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }

    /// Record a failed login attempt, locking after `max_attempts`.
    pub fn record_failed_attempt(&mut self, now: i64, max_attempts: u32, lock_millis: i64) {
        self.failed_attempts += 1;
        if self.failed_attempts >= max_attempts {
            self.locked_until = Some(now + lock_millis);
            self.failed_attempts = 0;
        }
    }

    /// Reset failed attempts (on successful login).
    pub fn reset_failed_attempts(&mut self) {
        self.failed_attempts = 0;
        self.locked_until = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(area: &str) -> Address {
        Address {
            area: area.to_string(),
            block: "1".to_string(),
            street: "2".to_string(),
            building: "3".to_string(),
            notes: None,
        }
    }

    #[test]
    fn test_role_permissions() {
        assert!(Role::Admin.has_permission(Role::Customer));
        assert!(!Role::Customer.has_permission(Role::Admin));
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_first_address_is_default() {
        let mut user = User::new("Sara", "sara@example.com", Role::Customer);
        user.add_address(SavedAddress::new("Home", address("Salmiya")));
        user.add_address(SavedAddress::new("Office", address("Sharq")));

        assert_eq!(user.default_address().map(|a| a.label.as_str()), Some("Home"));
    }

    #[test]
    fn test_new_default_replaces_old() {
        let mut user = User::new("Sara", "sara@example.com", Role::Customer);
        user.add_address(SavedAddress::new("Home", address("Salmiya")));
        let mut office = SavedAddress::new("Office", address("Sharq"));
        office.is_default = true;
        user.add_address(office);

        assert_eq!(user.default_address().map(|a| a.label.as_str()), Some("Office"));
        assert_eq!(user.addresses.iter().filter(|a| a.is_default).count(), 1);
    }

    #[test]
    fn test_contact_snapshot_uses_default_address() {
        let mut user = User::new("Sara", "sara@example.com", Role::Customer);
        user.phone = "55551234".to_string();
        user.add_address(SavedAddress::new("Home", address("Salmiya")));

        let snapshot = user.contact_snapshot();
        assert_eq!(snapshot.full_name, "Sara");
        assert_eq!(snapshot.address.area, "Salmiya");
        assert!(snapshot.is_complete());
    }

    #[test]
    fn test_lockout() {
        let mut creds = UserCredentials::new(User::new("a", "a@x.io", Role::Customer), "hash");
        creds.record_failed_attempt(1_000, 2, 500);
        assert!(!creds.is_locked(1_000));
        creds.record_failed_attempt(1_000, 2, 500);
        assert!(creds.is_locked(1_200));
        assert!(!creds.is_locked(1_500));
    }
}
