//! User domain module.
//!
//! # Module Structure
//!
//! - `model`: identity records and provider inputs
//! - `identity`: the identity provider trait
//! - `auth_state`: change-notification plumbing shared by providers
//! - `session`: session state machine and snapshots
//! - `storage`: persisted sessions for the `local` persistence mode

mod auth_state;
mod identity;
mod model;
mod session;
mod storage;

// Re-export public API
pub use auth_state::{AuthStateBroadcaster, AuthStateEvent, AuthStateSubscription};
pub use identity::IdentityProvider;
pub use model::{AuthUser, EmailCredential, Persistence, ProfileUpdate, validate_email};
pub use session::{Session, SessionState};
pub use storage::{PersistedSession, SessionStorage};
