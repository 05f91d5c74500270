//! Login session.

use shopfront_cache::now_millis;
use shopfront_commerce::checkout::CustomerSnapshot;

use crate::directory::AccountDirectory;
use crate::user::{Credentials, Role, User};
use crate::AuthError;

/// The signed-in user for one browsing session.
///
/// Role checks here gate client-side views only. Anything the admin views
/// call must enforce roles again on its own side.
#[derive(Debug, Clone, Default)]
pub struct AuthSession {
    current: Option<User>,
    signed_in_at: Option<i64>,
}

impl AuthSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sign in, replacing any current user.
    pub fn login(
        &mut self,
        directory: &mut AccountDirectory,
        credentials: &Credentials,
    ) -> Result<&User, AuthError> {
        let now = now_millis();
        let user = directory.authenticate_at(credentials, now)?;
        tracing::info!(user_id = %user.id, role = user.role.as_str(), "signed in");
        self.signed_in_at = Some(now);
        let user = self.current.insert(user);
        Ok(&*user)
    }

    /// Sign out. Session-scoped state (cart, lists) is not touched.
    pub fn logout(&mut self) -> Option<User> {
        self.signed_in_at = None;
        let user = self.current.take();
        if let Some(user) = &user {
            tracing::info!(user_id = %user.id, "signed out");
        }
        user
    }

    pub fn current(&self) -> Option<&User> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// Unix millis of the current sign-in.
    pub fn signed_in_at(&self) -> Option<i64> {
        self.signed_in_at
    }

    /// The current user if they hold at least `required`.
    pub fn require_role(&self, required: Role) -> Result<&User, AuthError> {
        let user = self.current.as_ref().ok_or(AuthError::NotSignedIn)?;
        if user.has_permission(required) {
            Ok(user)
        } else {
            Err(AuthError::InsufficientPermissions { required })
        }
    }

    /// Contact details of the signed-in user, for checkout pre-fill and as
    /// the fallback customer when a hand-off ticket is gone.
    pub fn contact_snapshot(&self) -> Option<CustomerSnapshot> {
        self.current.as_ref().map(User::contact_snapshot)
    }

    /// Replace the cached user after a profile change.
    pub fn refresh(&mut self, user: &User) {
        if let Some(current) = &mut self.current {
            if current.id == user.id {
                *current = user.clone();
            }
        }
    }
}
