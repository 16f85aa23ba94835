//! Configuration service implementation.
//!
//! Loads the root configuration from `config.toml` and caches it.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use motio_core::config::RootConfig;
use motio_core::{MotioError, Result};

use crate::atomic_file::{FileMode, write_atomic};
use crate::paths::MotioPaths;

/// Configuration service that loads and caches the root configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration. Uses RwLock for thread-safe lazy loading.
    config: Arc<RwLock<Option<RootConfig>>>,
}

impl ConfigService {
    pub fn new(paths: &MotioPaths) -> Result<Self> {
        Ok(Self::with_path(paths.config_file()?))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Gets the root configuration, loading from file if not cached.
    ///
    /// A missing or unreadable file yields the defaults; the problem is logged.
    pub fn get_config(&self) -> RootConfig {
        {
            let read_lock = self.config.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let loaded = self.load().unwrap_or_else(|e| {
            tracing::warn!("[ConfigService] Using default configuration: {}", e);
            RootConfig::default()
        });

        let mut write_lock = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *write_lock = Some(loaded.clone());
        loaded
    }

    /// Reads `config.toml` without touching the cache.
    pub fn load(&self) -> Result<RootConfig> {
        if !self.path.exists() {
            return Ok(RootConfig::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(RootConfig::default());
        }
        toml::from_str(&content).map_err(|e| {
            MotioError::config(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }

    /// Writes `config` to disk and refreshes the cache.
    pub fn save(&self, config: &RootConfig) -> Result<()> {
        let content = toml::to_string_pretty(config)?;
        write_atomic(&self.path, content.as_bytes(), FileMode::Default)?;

        let mut write_lock = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *write_lock = Some(config.clone());
        tracing::debug!("[ConfigService] Saved {}", self.path.display());
        Ok(())
    }

    /// Applies `change` to the current configuration and saves the result.
    pub fn update<F>(&self, change: F) -> Result<RootConfig>
    where
        F: FnOnce(&mut RootConfig),
    {
        let mut config = self.get_config();
        change(&mut config);
        self.save(&config)?;
        Ok(config)
    }
}
