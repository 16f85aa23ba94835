//! Session state of the running application.

use super::model::AuthUser;

/// Lifecycle of the session container.
///
/// `Uninitialized -> Initializing -> {Authenticated, Unauthenticated}`, then
/// `Authenticated <-> Unauthenticated` as the provider reports changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Uninitialized,
    /// Subscribed, waiting for the provider's first emission.
    Initializing,
    Authenticated(AuthUser),
    Unauthenticated,
}

impl SessionState {
    /// State after a provider emission.
    pub fn from_event(user: Option<AuthUser>) -> Self {
        match user {
            Some(user) => Self::Authenticated(user),
            None => Self::Unauthenticated,
        }
    }

    /// True once the provider has reported whether anyone is signed in.
    pub fn is_initialized(&self) -> bool {
        matches!(self, Self::Authenticated(_) | Self::Unauthenticated)
    }

    pub fn current_user(&self) -> Option<&AuthUser> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn session(&self) -> Session {
        Session {
            current_user: self.current_user().cloned(),
            initialized: self.is_initialized(),
        }
    }
}

/// Snapshot of who is signed in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Meaningless until `initialized` is true.
    pub current_user: Option<AuthUser>,
    pub initialized: bool,
}

impl Session {
    /// Whether a view should send the user to the login screen.
    ///
    /// Never true before initialization: an unknown user is not a signed-out
    /// user.
    pub fn login_redirect_required(&self) -> bool {
        self.initialized && self.current_user.is_none()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current_user.is_some()
    }
}
