//! Identity records and the values passed to the identity provider.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ValidationError;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// The signed-in account as reported by the identity provider.
///
/// Carries no tokens; those stay inside the provider client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    /// Provider-assigned unique id.
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    /// Avatar URL.
    pub photo_url: Option<String>,
}

impl AuthUser {
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: Some(email.into()),
            display_name: None,
            photo_url: None,
        }
    }

    /// Name to greet the user with: display name, else email, else uid.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(self.email.as_deref())
            .unwrap_or(&self.uid)
    }

    /// Returns a copy with `update` applied, as the provider would store it.
    pub fn with_profile(&self, update: &ProfileUpdate) -> Self {
        let mut user = self.clone();
        if let Some(name) = &update.display_name {
            user.display_name = Some(name.clone());
        }
        if let Some(photo) = &update.photo_url {
            user.photo_url = photo.clone();
        }
        user
    }
}

/// Profile fields to change.
///
/// `display_name: None` leaves the name untouched. `photo_url: None` leaves
/// the avatar untouched, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub photo_url: Option<Option<String>>,
}

impl ProfileUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_photo_url(mut self, url: Option<String>) -> Self {
        self.photo_url = Some(url);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.photo_url.is_none()
    }
}

/// Email/password pair used for re-authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct EmailCredential {
    pub email: String,
    pub password: String,
}

impl EmailCredential {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for EmailCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailCredential")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where the provider keeps the signed-in session between process runs.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Persistence {
    /// Survives restarts.
    #[default]
    Local,
    /// Lives only as long as the current process.
    Session,
}

/// Checks that `email` looks like `local@domain.tld`.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_PATTERN.is_match(email.trim()) {
        Ok(())
    } else {
        Err(ValidationError::new(
            "email",
            "The email address is badly formatted.",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email(" ann@example.org ").is_ok());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_with_profile_sets_and_clears_photo() {
        let mut user = AuthUser::new("u1", "a@b.com");
        user.photo_url = Some("https://img/old.png".into());

        let renamed = user.with_profile(&ProfileUpdate::new().with_display_name("Ann"));
        assert_eq!(renamed.display_name.as_deref(), Some("Ann"));
        assert_eq!(renamed.photo_url.as_deref(), Some("https://img/old.png"));

        let cleared = renamed.with_profile(&ProfileUpdate::new().with_photo_url(None));
        assert!(cleared.photo_url.is_none());
        assert_eq!(cleared.display_name.as_deref(), Some("Ann"));
    }

    #[test]
    fn test_label_prefers_display_name() {
        let mut user = AuthUser::new("u1", "a@b.com");
        assert_eq!(user.label(), "a@b.com");
        user.display_name = Some("Ann".into());
        assert_eq!(user.label(), "Ann");
    }

    #[test]
    fn test_persistence_parse() {
        assert_eq!(Persistence::from_str("session").unwrap(), Persistence::Session);
        assert_eq!(Persistence::Local.to_string(), "local");
    }

    #[test]
    fn test_credential_debug_hides_password() {
        let credential = EmailCredential::new("a@b.com", "Secret123!");
        assert!(!format!("{credential:?}").contains("Secret123!"));
    }
}
