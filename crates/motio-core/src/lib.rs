pub mod config;
pub mod error;
pub mod notification;
pub mod prompt;
pub mod secret;
pub mod theme;
pub mod user;

// Re-export common error type
pub use error::{AuthError, AuthErrorReason, MotioError, Result, UpstreamError, ValidationError};
pub use notification::{Notification, NotificationVariant};
pub use theme::Theme;
