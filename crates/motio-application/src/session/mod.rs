//! Session application services.
//!
//! - `store`: the session state container and account operations
//! - `password`: change-password form validation

mod password;
mod store;

pub use password::ChangePasswordForm;
pub use store::SessionStore;
