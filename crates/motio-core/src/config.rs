//! Application configuration models (`config.toml` and `secret.json`).

use serde::{Deserialize, Serialize};

use crate::theme::Theme;
use crate::user::Persistence;

pub const DEFAULT_IDENTITY_ENDPOINT: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://securetoken.googleapis.com/v1";
pub const DEFAULT_MODEL_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL_NAME: &str = "gemini-2.5-flash";
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 120;

/// Root of `config.toml`. Every key is optional.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RootConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_level: String,
    pub identity: IdentitySettings,
    pub model: ModelSettings,
    pub ui: UiSettings,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            identity: IdentitySettings::default(),
            model: ModelSettings::default(),
            ui: UiSettings::default(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct IdentitySettings {
    pub persistence: Persistence,
    pub endpoint: String,
    /// Token refresh endpoint.
    pub token_endpoint: String,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            persistence: Persistence::Local,
            endpoint: DEFAULT_IDENTITY_ENDPOINT.to_string(),
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ModelSettings {
    pub name: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL_NAME.to_string(),
            endpoint: DEFAULT_MODEL_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_MODEL_TIMEOUT_SECS,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct UiSettings {
    /// Unset means "follow the system preference".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
}

/// Root of `secret.json`.
#[derive(Deserialize, Serialize, Clone, Default)]
pub struct SecretConfig {
    #[serde(default)]
    pub identity: Option<ApiKeyConfig>,
    #[serde(default)]
    pub gemini: Option<ApiKeyConfig>,
}

#[derive(Deserialize, Serialize, Clone)]
pub struct ApiKeyConfig {
    pub api_key: String,
}

impl std::fmt::Debug for SecretConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretConfig")
            .field("identity", &self.identity.as_ref().map(|_| "<redacted>"))
            .field("gemini", &self.gemini.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
