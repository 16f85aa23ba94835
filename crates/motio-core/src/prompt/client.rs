use super::model::{GenerateAnimationOutput, ImprovePromptOutput, PromptRequest};
use crate::error::UpstreamError;

/// Generative model operations used by the prompt workflows.
///
/// Implementations perform exactly one remote round trip per call and return
/// the model's output as received. Shape checks belong to the caller.
#[async_trait::async_trait]
pub trait PromptModel: Send + Sync {
    /// Asks the model to rewrite `request.prompt` into a better one.
    async fn improve_prompt(
        &self,
        request: &PromptRequest,
    ) -> Result<ImprovePromptOutput, UpstreamError>;

    /// Asks the model to render an animation for `request.prompt`.
    async fn generate_animation(
        &self,
        request: &PromptRequest,
    ) -> Result<GenerateAnimationOutput, UpstreamError>;
}
