//! Prompt Workflow
//!
//! Thin request/response wrappers around a [`PromptModel`]. Each call checks
//! the request, makes exactly one model round trip and checks the result.
//! Nothing is retried or cached.

use std::sync::Arc;

use motio_core::Result;
use motio_core::prompt::{GenerateAnimationOutput, ImprovePromptOutput, PromptModel, PromptRequest};

pub struct PromptWorkflow {
    model: Arc<dyn PromptModel>,
}

impl PromptWorkflow {
    pub fn new(model: Arc<dyn PromptModel>) -> Self {
        Self { model }
    }

    /// Asks the model to rewrite `request.prompt` into a better animation
    /// prompt.
    ///
    /// # Errors
    ///
    /// `Validation` for an empty prompt (the model is not called) or an
    /// empty result, `Upstream` when the model call fails.
    pub async fn improve_prompt(&self, request: &PromptRequest) -> Result<ImprovePromptOutput> {
        request.validate()?;
        tracing::debug!("[PromptWorkflow] improvePrompt");

        let output = self.model.improve_prompt(request).await?;
        output.validate()?;
        Ok(output)
    }

    /// Generates an animation for `request.prompt`.
    ///
    /// The returned data URI is exactly what the model produced, after
    /// checking it is a well-formed base64 data URI.
    pub async fn generate_animation(
        &self,
        request: &PromptRequest,
    ) -> Result<GenerateAnimationOutput> {
        request.validate()?;
        tracing::debug!("[PromptWorkflow] generateAnimation");

        let output = self.model.generate_animation(request).await?;
        let uri = output.data_uri()?;
        tracing::info!(
            "[PromptWorkflow] Animation generated ({}, {} base64 chars)",
            uri.mime_type(),
            uri.payload().len()
        );
        Ok(output)
    }
}
