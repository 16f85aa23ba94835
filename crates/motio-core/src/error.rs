//! Error types for the motio application.
//!
//! Each external boundary gets its own closed error type so callers can match
//! exhaustively: [`ValidationError`] for shape checks done locally,
//! [`AuthError`] for identity-provider rejections and [`UpstreamError`] for
//! generative-model failures. [`MotioError`] wraps them for propagation.

use thiserror::Error;

/// Why the identity provider rejected a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AuthErrorReason {
    EmailAlreadyInUse,
    InvalidEmail,
    WeakPassword,
    WrongCredentials,
    UserNotFound,
    UserDisabled,
    TooManyRequests,
    RequiresRecentLogin,
    SessionExpired,
    OperationNotAllowed,
    /// The provider could not be reached at all.
    Network,
    /// A provider code outside the known set, kept verbatim.
    Other(String),
}

impl AuthErrorReason {
    /// Maps an identity REST API error code (e.g. `EMAIL_EXISTS`) to a reason.
    ///
    /// The API sometimes appends detail after the code
    /// (`WEAK_PASSWORD : Password should be at least 6 characters`), so only
    /// the leading token is matched.
    pub fn from_provider_code(raw: &str) -> Self {
        let code = raw.split([' ', ':']).next().unwrap_or_default().trim();
        match code {
            "EMAIL_EXISTS" => Self::EmailAlreadyInUse,
            "INVALID_EMAIL" | "MISSING_EMAIL" => Self::InvalidEmail,
            "WEAK_PASSWORD" => Self::WeakPassword,
            "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "MISSING_PASSWORD" => {
                Self::WrongCredentials
            }
            "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => Self::UserNotFound,
            "USER_DISABLED" => Self::UserDisabled,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyRequests,
            "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => Self::RequiresRecentLogin,
            "TOKEN_EXPIRED" | "INVALID_ID_TOKEN" | "INVALID_REFRESH_TOKEN" => {
                Self::SessionExpired
            }
            "OPERATION_NOT_ALLOWED" | "PASSWORD_LOGIN_DISABLED" => Self::OperationNotAllowed,
            other => Self::Other(other.to_string()),
        }
    }

    /// Stable, provider-independent code for this reason.
    pub fn code(&self) -> &str {
        match self {
            Self::EmailAlreadyInUse => "auth/email-already-in-use",
            Self::InvalidEmail => "auth/invalid-email",
            Self::WeakPassword => "auth/weak-password",
            Self::WrongCredentials => "auth/wrong-credentials",
            Self::UserNotFound => "auth/user-not-found",
            Self::UserDisabled => "auth/user-disabled",
            Self::TooManyRequests => "auth/too-many-requests",
            Self::RequiresRecentLogin => "auth/requires-recent-login",
            Self::SessionExpired => "auth/session-expired",
            Self::OperationNotAllowed => "auth/operation-not-allowed",
            Self::Network => "auth/network-request-failed",
            Self::Other(code) => code,
        }
    }

    /// Human-readable text for user-facing notifications.
    ///
    /// Returns `None` for unknown provider codes.
    pub fn description(&self) -> Option<&'static str> {
        let text = match self {
            Self::EmailAlreadyInUse => "Email already in use.",
            Self::InvalidEmail => "The email address is badly formatted.",
            Self::WeakPassword => "Password is too weak. Please choose a stronger password.",
            Self::WrongCredentials => "Incorrect email or password.",
            Self::UserNotFound => "No account exists for this email.",
            Self::UserDisabled => "This account has been disabled.",
            Self::TooManyRequests => "Too many attempts. Please try again later.",
            Self::RequiresRecentLogin => {
                "Please log out and log in again to change your password."
            }
            Self::SessionExpired => "Your session has expired. Please log in again.",
            Self::OperationNotAllowed => "Email/password sign-in is not enabled.",
            Self::Network => "Could not reach the authentication service.",
            Self::Other(_) => return None,
        };
        Some(text)
    }
}

impl std::fmt::Display for AuthErrorReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Rejection reported by the identity provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Authentication failed ({reason})")]
pub struct AuthError {
    pub reason: AuthErrorReason,
    /// Raw provider message, if any. Never contains credentials.
    pub message: Option<String>,
}

impl AuthError {
    pub fn new(reason: AuthErrorReason) -> Self {
        Self {
            reason,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(AuthErrorReason::Network).with_message(message)
    }

    /// Text shown to the user: the reason description, else the raw message.
    pub fn user_message(&self) -> Option<String> {
        self.reason
            .description()
            .map(str::to_string)
            .or_else(|| self.message.clone().filter(|m| !m.trim().is_empty()))
    }
}

/// Failure of a generative-model round trip.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("Generative model request failed: {message}")]
    Transport { message: String },

    #[error("Generative model request timed out")]
    Timeout,

    #[error("Generative model returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Generative model returned a malformed response: {0}")]
    MalformedResponse(String),
}

/// A value failed a local shape check before or after a remote call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    /// Name of the offending field (`prompt`, `improvedPrompt`, ...).
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// A shared error type for the entire motio application.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MotioError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// An operation that needs a signed-in user ran without one.
    #[error("No user is currently signed in (auth/no-session)")]
    NoSession,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {message}")]
    Io { message: String },

    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MotioError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation(ValidationError::new(field, message))
    }

    pub fn auth(reason: AuthErrorReason) -> Self {
        Self::Auth(AuthError::new(reason))
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_no_session(&self) -> bool {
        matches!(self, Self::NoSession)
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream(_))
    }

    /// Returns the auth reason when this is an identity-provider rejection.
    pub fn auth_reason(&self) -> Option<&AuthErrorReason> {
        match self {
            Self::Auth(err) => Some(&err.reason),
            _ => None,
        }
    }

    /// Short, human-readable description for a notification.
    ///
    /// `None` means nothing more specific than a generic message is known.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Validation(err) => Some(err.message.clone()),
            Self::Auth(err) => err.user_message(),
            Self::NoSession => Some("No user is currently signed in.".to_string()),
            Self::Upstream(UpstreamError::Timeout) => {
                Some("The request timed out. Please try again.".to_string())
            }
            Self::Upstream(UpstreamError::Transport { .. }) => {
                Some("Could not reach the generative model service.".to_string())
            }
            Self::Upstream(UpstreamError::Http { message, .. }) if !message.trim().is_empty() => {
                Some(message.clone())
            }
            Self::Upstream(_)
            | Self::Config(_)
            | Self::Io { .. }
            | Self::Serialization { .. }
            | Self::Internal(_) => None,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for MotioError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for MotioError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for MotioError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for MotioError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, MotioError>`.
pub type Result<T> = std::result::Result<T, MotioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_code_with_detail_suffix() {
        let reason = AuthErrorReason::from_provider_code(
            "WEAK_PASSWORD : Password should be at least 6 characters",
        );
        assert_eq!(reason, AuthErrorReason::WeakPassword);
    }

    #[test]
    fn test_unknown_provider_code_is_kept() {
        let reason = AuthErrorReason::from_provider_code("QUOTA_EXCEEDED");
        assert_eq!(reason, AuthErrorReason::Other("QUOTA_EXCEEDED".to_string()));
        assert_eq!(reason.code(), "QUOTA_EXCEEDED");
        assert!(reason.description().is_none());
    }

    #[test]
    fn test_login_credential_codes_collapse() {
        for code in ["INVALID_PASSWORD", "INVALID_LOGIN_CREDENTIALS"] {
            assert_eq!(
                AuthErrorReason::from_provider_code(code),
                AuthErrorReason::WrongCredentials
            );
        }
    }

    #[test]
    fn test_user_message_falls_back_to_raw_message() {
        let err = AuthError::new(AuthErrorReason::Other("X".into())).with_message("raw text");
        assert_eq!(err.user_message().as_deref(), Some("raw text"));

        let err = AuthError::new(AuthErrorReason::Other("X".into()));
        assert!(MotioError::Auth(err).user_message().is_none());
    }

    #[test]
    fn test_no_session_display_carries_code() {
        let err = MotioError::NoSession;
        assert!(err.to_string().contains("auth/no-session"));
        assert!(err.is_no_session());
    }

    #[test]
    fn test_malformed_upstream_has_no_user_message() {
        let err = MotioError::from(UpstreamError::MalformedResponse("eof".into()));
        assert!(err.is_upstream());
        assert!(err.user_message().is_none());
    }
}
