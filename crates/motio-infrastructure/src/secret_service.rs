//! Secret service implementation.
//!
//! Reads API keys from `secret.json`, with environment variables taking
//! precedence.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use motio_core::config::SecretConfig;
use motio_core::secret::SecretService;
use motio_core::{MotioError, Result};

use crate::paths::MotioPaths;

pub const IDENTITY_API_KEY_ENV: &str = "MOTIO_IDENTITY_API_KEY";
pub const GEMINI_API_KEY_ENV: &str = "MOTIO_GEMINI_API_KEY";

/// Service for loading secret configuration.
///
/// The file is read once and cached.
#[derive(Clone)]
pub struct SecretServiceImpl {
    path: PathBuf,
    secrets: Arc<RwLock<Option<SecretConfig>>>,
}

impl SecretServiceImpl {
    pub fn new(paths: &MotioPaths) -> Result<Self> {
        Ok(Self::with_path(paths.secret_file()?))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            secrets: Arc::new(RwLock::new(None)),
        }
    }

    fn load_secrets_internal(&self) -> Result<SecretConfig> {
        {
            let read_lock = self.secrets.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let loaded = if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            // The parser error never echoes the file contents back.
            serde_json::from_str(&content).map_err(|e| {
                MotioError::config(format!(
                    "Failed to parse {} (line {})",
                    self.path.display(),
                    e.line()
                ))
            })?
        } else {
            SecretConfig::default()
        };

        let mut write_lock = self.secrets.write().unwrap_or_else(PoisonError::into_inner);
        *write_lock = Some(loaded.clone());
        Ok(loaded)
    }

    fn resolve_key(
        &self,
        env_var: &str,
        from_file: impl FnOnce(&SecretConfig) -> Option<String>,
        what: &str,
    ) -> Result<String> {
        if let Ok(value) = std::env::var(env_var) {
            if !value.trim().is_empty() {
                return Ok(value);
            }
        }

        let secrets = self.load_secrets_internal()?;
        from_file(&secrets)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                MotioError::config(format!(
                    "{what} API key not configured: set {env_var} or add it to {}",
                    self.path.display()
                ))
            })
    }
}

#[async_trait::async_trait]
impl SecretService for SecretServiceImpl {
    async fn load_secrets(&self) -> Result<SecretConfig> {
        self.load_secrets_internal()
    }

    async fn identity_api_key(&self) -> Result<String> {
        self.resolve_key(
            IDENTITY_API_KEY_ENV,
            |s| s.identity.as_ref().map(|c| c.api_key.clone()),
            "Identity",
        )
    }

    async fn gemini_api_key(&self) -> Result<String> {
        self.resolve_key(
            GEMINI_API_KEY_ENV,
            |s| s.gemini.as_ref().map(|c| c.api_key.clone()),
            "Gemini",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_keys_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.json");
        std::fs::write(
            &path,
            r#"{"identity":{"api_key":"id-key"},"gemini":{"api_key":"gm-key"}}"#,
        )
        .unwrap();

        let service = SecretServiceImpl::with_path(path);
        let secrets = service.load_secrets().await.unwrap();
        assert_eq!(secrets.identity.unwrap().api_key, "id-key");
        assert_eq!(secrets.gemini.unwrap().api_key, "gm-key");
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let service = SecretServiceImpl::with_path(dir.path().join("secret.json"));
        let secrets = service.load_secrets().await.unwrap();
        assert!(secrets.identity.is_none());
        assert!(secrets.gemini.is_none());
    }

    #[test]
    fn test_blank_key_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.json");
        std::fs::write(&path, r#"{"gemini":{"api_key":"  "}}"#).unwrap();

        let service = SecretServiceImpl::with_path(path);
        let err = service
            .resolve_key(
                "MOTIO_TEST_UNSET_KEY_VAR",
                |s| s.gemini.as_ref().map(|c| c.api_key.clone()),
                "Gemini",
            )
            .unwrap_err();
        assert!(
            matches!(err, MotioError::Config(ref msg) if msg.contains("MOTIO_TEST_UNSET_KEY_VAR"))
        );
    }

    #[test]
    fn test_parse_error_hides_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.json");
        std::fs::write(&path, r#"{"gemini":{"api_key":"leaky-value""#).unwrap();

        let err = SecretServiceImpl::with_path(path)
            .load_secrets_internal()
            .unwrap_err();
        assert!(!err.to_string().contains("leaky-value"));
    }
}
