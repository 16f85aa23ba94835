//! Clients for the external services motio talks to.
//!
//! - [`IdentityToolkitClient`]: accounts and sessions
//! - [`GeminiPromptModel`]: prompt improvement and animation generation

pub mod gemini_api_agent;
pub mod identity_toolkit;
pub mod prompts;

pub use gemini_api_agent::GeminiPromptModel;
pub use identity_toolkit::IdentityToolkitClient;
