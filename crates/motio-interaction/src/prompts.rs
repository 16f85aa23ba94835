//! Prompt templates sent to the generative model.

use minijinja::{Environment, context};

use motio_core::prompt::PromptRequest;

pub const IMPROVE_PROMPT_TEMPLATE: &str = "You are an AI prompt enhancer for animation generation. \
Given the following prompt, suggest an improved prompt that would generate a better animation.\n\n\
Original Prompt: {{ prompt }}\n\nImproved Prompt:";

pub const GENERATE_ANIMATION_TEMPLATE: &str =
    "Generate an animation data URI based on the following prompt:\n\nPrompt: {{ prompt }}";

/// Renders `template` with the request's prompt interpolated verbatim.
pub fn render(template: &str, request: &PromptRequest) -> Result<String, minijinja::Error> {
    // Plain-text templates: no auto-escaping.
    let env = Environment::new();
    env.render_str(template, context! { prompt => request.prompt })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_improve_template_interpolates_prompt() {
        let text = render(IMPROVE_PROMPT_TEMPLATE, &PromptRequest::new("cat")).unwrap();
        assert!(text.starts_with("You are an AI prompt enhancer for animation generation."));
        assert!(text.contains("\n\nOriginal Prompt: cat\n\nImproved Prompt:"));
    }

    #[test]
    fn test_markup_in_prompt_is_not_escaped() {
        let request = PromptRequest::new("a <b>bold</b> & \"quoted\" cat");
        let text = render(GENERATE_ANIMATION_TEMPLATE, &request).unwrap();
        assert!(text.ends_with("Prompt: a <b>bold</b> & \"quoted\" cat"));
    }
}
