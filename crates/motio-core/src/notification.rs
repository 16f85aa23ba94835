//! User-facing notifications ("toasts").

use serde::Serialize;

use crate::error::MotioError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationVariant {
    #[default]
    Default,
    Destructive,
}

/// One dismissible message: short title plus a readable description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: NotificationVariant,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NotificationVariant::Default,
        }
    }

    /// Describes `error`, using `fallback` when the error has no readable text.
    pub fn failure(title: impl Into<String>, error: &MotioError, fallback: &str) -> Self {
        Self {
            title: title.into(),
            description: error.user_message().unwrap_or_else(|| fallback.to_string()),
            variant: NotificationVariant::Destructive,
        }
    }

    pub fn is_destructive(&self) -> bool {
        self.variant == NotificationVariant::Destructive
    }
}
