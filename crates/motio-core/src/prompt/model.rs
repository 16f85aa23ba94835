use serde::{Deserialize, Serialize};

use super::data_uri::DataUri;
use crate::error::ValidationError;

/// Input to both prompt workflows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

impl PromptRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }

    /// Rejects a missing, empty or whitespace-only prompt.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("prompt", &self.prompt)
    }
}

/// Raw rewrite result as the model returned it.
///
/// A missing field deserializes as empty so the workflow can reject it as a
/// shape violation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovePromptOutput {
    #[serde(default)]
    pub improved_prompt: String,
}

/// Raw animation result as the model returned it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAnimationOutput {
    #[serde(default)]
    pub animation_data_uri: String,
}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new(field, format!("`{field}` must not be empty.")))
    } else {
        Ok(())
    }
}

impl ImprovePromptOutput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("improvedPrompt", &self.improved_prompt)
    }
}

impl GenerateAnimationOutput {
    /// Checks the field is present and a well-formed base64 data URI.
    pub fn data_uri(&self) -> Result<DataUri, ValidationError> {
        require_text("animationDataUri", &self.animation_data_uri)?;
        DataUri::parse(self.animation_data_uri.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_request_validation() {
        assert!(PromptRequest::new("cat").validate().is_ok());

        let err = PromptRequest::new("").validate().unwrap_err();
        assert_eq!(err.field, "prompt");
        assert!(PromptRequest::new("   \n").validate().is_err());
    }

    #[test]
    fn test_missing_output_field_deserializes_empty() {
        let output: ImprovePromptOutput = serde_json::from_str("{}").unwrap();
        assert!(output.validate().is_err());

        let output: GenerateAnimationOutput =
            serde_json::from_str(r#"{"animationDataUri":"data:video/mp4;base64,AAAA"}"#).unwrap();
        assert_eq!(output.animation_data_uri, "data:video/mp4;base64,AAAA");
        assert_eq!(output.data_uri().unwrap().mime_type(), "video/mp4");
    }

    #[test]
    fn test_empty_animation_uri_is_rejected() {
        let err = GenerateAnimationOutput::default().data_uri().unwrap_err();
        assert_eq!(err.field, "animationDataUri");
    }
}
