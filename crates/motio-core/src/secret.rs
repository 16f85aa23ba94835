//! Secret management service trait.
//!
//! Defines the interface for loading API keys from secure storage.

use crate::config::SecretConfig;
use crate::error::Result;

/// Service for loading secret configuration.
///
/// Implementations must never log secrets or include them in error messages.
#[async_trait::async_trait]
pub trait SecretService: Send + Sync {
    /// Loads the secret configuration.
    async fn load_secrets(&self) -> Result<SecretConfig>;

    /// API key for the identity service.
    async fn identity_api_key(&self) -> Result<String>;

    /// API key for the generative model.
    async fn gemini_api_key(&self) -> Result<String>;
}
