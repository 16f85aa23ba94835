//! Identity provider interface.

use super::auth_state::AuthStateSubscription;
use super::model::{AuthUser, EmailCredential, Persistence, ProfileUpdate};
use crate::error::AuthError;

/// Account and session operations offered by an external identity service.
///
/// Implementations are the single source of auth-state changes: every call
/// that changes the signed-in user record (account creation, sign in, sign
/// out, profile update) must be reflected through
/// [`on_auth_state_changed`](IdentityProvider::on_auth_state_changed).
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates an account and signs it in.
    async fn create_account(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    /// Updates profile fields of `user` and returns the stored record.
    async fn set_profile(
        &self,
        user: &AuthUser,
        update: &ProfileUpdate,
    ) -> Result<AuthUser, AuthError>;

    /// Signs in. The resulting user arrives through the state stream.
    async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError>;

    /// Ends the current session. Succeeds when nobody is signed in.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Confirms `credential` still belongs to `user`.
    async fn reauthenticate(
        &self,
        user: &AuthUser,
        credential: &EmailCredential,
    ) -> Result<(), AuthError>;

    async fn change_password(&self, user: &AuthUser, new_password: &str) -> Result<(), AuthError>;

    /// Selects where subsequent sign-ins are kept.
    async fn set_persistence(&self, persistence: Persistence) -> Result<(), AuthError>;

    /// Registers for auth-state emissions.
    fn on_auth_state_changed(&self) -> AuthStateSubscription;

    /// The provider's own view of the signed-in user.
    fn current_user(&self) -> Option<AuthUser>;
}
