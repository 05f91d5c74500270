//! In-memory account directory.

use std::collections::HashMap;
use std::time::Duration;

use crate::password::PasswordHasher;
use crate::user::{Credentials, Role, SavedAddress, User, UserCredentials};
use crate::AuthError;

/// Failed attempts before an account is locked.
pub const DEFAULT_MAX_FAILED_ATTEMPTS: u32 = 5;

/// How long a locked account stays locked.
pub const DEFAULT_LOCKOUT: Duration = Duration::from_secs(15 * 60);

/// Registered accounts keyed by normalized email.
#[derive(Debug, Clone)]
pub struct AccountDirectory {
    accounts: HashMap<String, UserCredentials>,
    hasher: PasswordHasher,
    max_failed_attempts: u32,
    lockout: Duration,
}

impl AccountDirectory {
    pub fn new(hasher: PasswordHasher) -> Self {
        Self {
            accounts: HashMap::new(),
            hasher,
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
            lockout: DEFAULT_LOCKOUT,
        }
    }

    /// Override the lockout policy.
    pub fn with_lockout(mut self, max_failed_attempts: u32, lockout: Duration) -> Self {
        self.max_failed_attempts = max_failed_attempts.max(1);
        self.lockout = lockout;
        self
    }

    /// Create an account.
    pub fn register(
        &mut self,
        name: &str,
        credentials: &Credentials,
        role: Role,
    ) -> Result<&User, AuthError> {
        let key = normalize_email(&credentials.email)?;
        if self.accounts.contains_key(&key) {
            return Err(AuthError::UserAlreadyExists(key));
        }
        PasswordHasher::validate_password(&credentials.password)?;

        let hash = self.hasher.hash(&credentials.password)?;
        let user = User::new(name.trim(), key.clone(), role);
        tracing::info!(user_id = %user.id, role = role.as_str(), "account registered");

        let account = self
            .accounts
            .entry(key)
            .or_insert(UserCredentials::new(user, hash));
        Ok(&account.user)
    }

    /// Check credentials at `now` (Unix millis), applying the lockout policy.
    pub fn authenticate_at(&mut self, credentials: &Credentials, now: i64) -> Result<User, AuthError> {
        let key = normalize_email(&credentials.email).map_err(|_| AuthError::InvalidCredentials)?;
        let Some(account) = self.accounts.get_mut(&key) else {
            tracing::debug!("login for unknown account");
            return Err(AuthError::InvalidCredentials);
        };

        if account.is_locked(now) {
            return Err(AuthError::AccountLocked {
                until: account.locked_until.unwrap_or(now),
            });
        }

        if self.hasher.verify(&credentials.password, &account.password_hash)? {
            account.reset_failed_attempts();
            Ok(account.user.clone())
        } else {
            account.record_failed_attempt(
                now,
                self.max_failed_attempts,
                self.lockout.as_millis() as i64,
            );
            tracing::warn!(user_id = %account.user.id, "failed login attempt");
            Err(AuthError::InvalidCredentials)
        }
    }

    pub fn get(&self, email: &str) -> Option<&User> {
        let key = normalize_email(email).ok()?;
        self.accounts.get(&key).map(|account| &account.user)
    }

    /// Save an address on an account.
    pub fn add_address(&mut self, email: &str, address: SavedAddress) -> Result<&User, AuthError> {
        let key = normalize_email(email)?;
        let account = self
            .accounts
            .get_mut(&key)
            .ok_or(AuthError::UserNotFound(key))?;
        account.user.add_address(address);
        Ok(&account.user)
    }

    /// Update contact phone.
    pub fn set_phone(&mut self, email: &str, phone: &str) -> Result<&User, AuthError> {
        let key = normalize_email(email)?;
        let account = self
            .accounts
            .get_mut(&key)
            .ok_or(AuthError::UserNotFound(key))?;
        account.user.phone = phone.trim().to_string();
        Ok(&account.user)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl Default for AccountDirectory {
    fn default() -> Self {
        Self::new(PasswordHasher::default())
    }
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AuthError::InvalidEmail(email)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> AccountDirectory {
        AccountDirectory::new(PasswordHasher::with_cost(1024, 1).unwrap())
            .with_lockout(3, Duration::from_secs(60))
    }

    fn creds(password: &str) -> Credentials {
        Credentials::new("Sara@Example.com", password)
    }

    #[test]
    fn test_register_and_authenticate() {
        let mut dir = directory();
        dir.register("Sara", &creds("Secret123"), Role::Customer).unwrap();

        let user = dir
            .authenticate_at(&Credentials::new("sara@example.com", "Secret123"), 0)
            .unwrap();
        assert_eq!(user.email, "sara@example.com");
        assert_eq!(user.role, Role::Customer);
    }

    #[test]
    fn test_register_rejects_duplicates_and_weak_passwords() {
        let mut dir = directory();
        dir.register("Sara", &creds("Secret123"), Role::Customer).unwrap();

        assert!(matches!(
            dir.register("Sara", &creds("Secret123"), Role::Customer),
            Err(AuthError::UserAlreadyExists(_))
        ));
        assert!(matches!(
            dir.register("Ali", &Credentials::new("ali@example.com", "weak"), Role::Customer),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(matches!(
            dir.register("Bad", &Credentials::new("no-at-sign", "Secret123"), Role::Customer),
            Err(AuthError::InvalidEmail(_))
        ));
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn test_unknown_account_is_invalid_credentials() {
        let mut dir = directory();
        assert!(matches!(
            dir.authenticate_at(&creds("Secret123"), 0),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_lockout_after_failures() {
        let mut dir = directory();
        dir.register("Sara", &creds("Secret123"), Role::Customer).unwrap();

        for _ in 0..3 {
            assert!(matches!(
                dir.authenticate_at(&creds("Wrong1234"), 1_000),
                Err(AuthError::InvalidCredentials)
            ));
        }
        assert!(matches!(
            dir.authenticate_at(&creds("Secret123"), 2_000),
            Err(AuthError::AccountLocked { until: 61_000 })
        ));
        assert!(dir.authenticate_at(&creds("Secret123"), 61_000).is_ok());
    }

    #[test]
    fn test_add_address() {
        let mut dir = directory();
        dir.register("Sara", &creds("Secret123"), Role::Customer).unwrap();
        dir.set_phone("sara@example.com", " 55551234 ").unwrap();
        let user = dir
            .add_address("sara@example.com", SavedAddress::new("Home", Default::default()))
            .unwrap();

        assert_eq!(user.addresses.len(), 1);
        assert_eq!(user.phone, "55551234");
        assert!(matches!(
            dir.add_address("nobody@example.com", SavedAddress::new("x", Default::default())),
            Err(AuthError::UserNotFound(_))
        ));
    }
}
