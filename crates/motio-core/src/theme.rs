use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Light/dark color scheme.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Stored preference wins, then the system preference, then light.
    pub fn initial(stored: Option<Theme>, prefers_dark: bool) -> Self {
        match stored {
            Some(theme) => theme,
            None if prefers_dark => Theme::Dark,
            None => Theme::Light,
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}
