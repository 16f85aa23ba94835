//! Unified path management for motio configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/motio/             # Config directory ($MOTIO_CONFIG_DIR overrides)
//! ├── config.toml              # Application configuration
//! ├── secret.json              # API keys
//! └── session.json             # Signed-in session (persistence = "local")
//! ```

use std::path::{Path, PathBuf};

use motio_core::config::{ApiKeyConfig, SecretConfig};

use crate::atomic_file::{FileMode, write_atomic};

/// Environment variable that replaces the platform config directory.
pub const CONFIG_DIR_ENV: &str = "MOTIO_CONFIG_DIR";

const APP_DIR_NAME: &str = "motio";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home/config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for motio_core::MotioError {
    fn from(err: PathError) -> Self {
        motio_core::MotioError::config(err.to_string())
    }
}

/// Resolves every file motio reads or writes.
///
/// `base` pins the config directory (tests, `--config-dir`); otherwise
/// `$MOTIO_CONFIG_DIR`, then the platform config directory, is used.
#[derive(Debug, Clone, Default)]
pub struct MotioPaths {
    base: Option<PathBuf>,
}

impl MotioPaths {
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(dir));
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(PathError::ConfigDirNotFound)
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// # Security Note
    ///
    /// Written with mode 600 on Unix.
    pub fn secret_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("secret.json"))
    }

    pub fn session_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("session.json"))
    }

    /// Ensures the secret file exists, creating a template with empty keys.
    pub fn ensure_secret_file(&self) -> std::io::Result<PathBuf> {
        let secret_path = self
            .secret_file()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()))?;

        if secret_path.exists() {
            return Ok(secret_path);
        }

        let template = SecretConfig {
            identity: Some(ApiKeyConfig {
                api_key: String::new(),
            }),
            gemini: Some(ApiKeyConfig {
                api_key: String::new(),
            }),
        };
        let template_json = serde_json::to_string_pretty(&template)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

        write_atomic(&secret_path, template_json.as_bytes(), FileMode::Private)?;
        tracing::info!("[Paths] Created secret template at {:?}", secret_path);

        Ok(secret_path)
    }
}
