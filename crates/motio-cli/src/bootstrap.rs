use std::sync::Arc;

use anyhow::{Context, Result};
use motio_application::{PromptWorkflow, SessionStore};
use motio_core::config::RootConfig;
use motio_core::secret::SecretService;
use motio_infrastructure::{ConfigService, FileSessionStorage, MotioPaths, SecretServiceImpl};
use motio_interaction::{GeminiPromptModel, IdentityToolkitClient};
use tokio::sync::OnceCell;

/// Composition root. Clients are built on first use so commands that do not
/// need an API key (e.g. `theme`) run without one.
pub struct AppBootstrap {
    paths: MotioPaths,
    config_service: ConfigService,
    secrets: SecretServiceImpl,
    config: RootConfig,
    session: OnceCell<SessionStore>,
}

impl AppBootstrap {
    pub fn new(paths: MotioPaths) -> Result<Self> {
        let config_service =
            ConfigService::new(&paths).context("Failed to locate config.toml")?;
        let secrets = SecretServiceImpl::new(&paths).context("Failed to locate secret.json")?;
        let config = config_service.get_config();

        Ok(Self {
            paths,
            config_service,
            secrets,
            config,
            session: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &RootConfig {
        &self.config
    }

    pub fn config_service(&self) -> &ConfigService {
        &self.config_service
    }

    /// The session container, connected to the identity service.
    pub async fn session_store(&self) -> Result<&SessionStore> {
        self.session
            .get_or_try_init(|| self.build_session_store())
            .await
    }

    async fn build_session_store(&self) -> Result<SessionStore> {
        let api_key = self
            .with_secret_template(self.secrets.identity_api_key().await)
            .context("Identity service is not configured")?;
        let storage = FileSessionStorage::new(&self.paths)?;

        let identity =
            IdentityToolkitClient::connect(api_key, &self.config.identity, Some(Arc::new(storage)))
                .await;
        tracing::info!(
            "[Bootstrap] Identity client ready (persistence: {})",
            self.config.identity.persistence
        );

        Ok(SessionStore::new(Arc::new(identity))
            .with_persistence(self.config.identity.persistence))
    }

    pub async fn prompt_workflow(&self) -> Result<PromptWorkflow> {
        let api_key = self
            .with_secret_template(self.secrets.gemini_api_key().await)
            .context("Generative model is not configured")?;
        let model = GeminiPromptModel::from_settings(api_key, &self.config.model);
        tracing::info!("[Bootstrap] Prompt model ready: {}", model.model());
        Ok(PromptWorkflow::new(Arc::new(model)))
    }

    /// Leaves a `secret.json` template behind when a key is missing.
    fn with_secret_template<T>(&self, result: motio_core::Result<T>) -> motio_core::Result<T> {
        if result.is_err() {
            match self.paths.ensure_secret_file() {
                Ok(path) => tracing::warn!("[Bootstrap] Add API keys to {}", path.display()),
                Err(e) => tracing::warn!("[Bootstrap] Failed to create secret template: {}", e),
            }
        }
        result
    }

    pub async fn shutdown(&self) {
        if let Some(store) = self.session.get() {
            store.shutdown().await;
        }
    }
}
