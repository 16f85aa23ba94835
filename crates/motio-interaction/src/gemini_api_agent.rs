//! GeminiPromptModel - Direct REST API implementation of [`PromptModel`].
//!
//! Each operation renders its template, asks Gemini for a JSON object with a
//! single string field, and returns the parsed object without further checks.

use std::time::Duration;

use motio_core::UpstreamError;
use motio_core::config::ModelSettings;
use motio_core::prompt::{GenerateAnimationOutput, ImprovePromptOutput, PromptModel, PromptRequest};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::prompts::{GENERATE_ANIMATION_TEMPLATE, IMPROVE_PROMPT_TEMPLATE, render};

/// [`PromptModel`] backed by the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiPromptModel {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiPromptModel {
    /// Creates a model client from `[model]` settings.
    pub fn from_settings(api_key: impl Into<String>, settings: &ModelSettings) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .unwrap_or_else(|err| {
                tracing::warn!("[GeminiPromptModel] Falling back to default HTTP client: {err}");
                Client::new()
            });

        Self {
            client,
            api_key: api_key.into(),
            model: settings.name.clone(),
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate<T: DeserializeOwned>(
        &self,
        flow: &'static str,
        template: &str,
        request: &PromptRequest,
        field: OutputField,
    ) -> Result<T, UpstreamError> {
        let text = render(template, request).map_err(|err| UpstreamError::Transport {
            message: format!("failed to build prompt: {err}"),
        })?;
        let body = GenerateContentRequest::json_output(text, field);

        tracing::debug!("[GeminiPromptModel] {flow} via {}", self.model);
        let raw = self.send_request(&body).await?;
        parse_output(&raw)
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> Result<String, UpstreamError> {
        let url = format!("{}/{model}:generateContent", self.endpoint, model = self.model);

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
            if err.is_timeout() {
                UpstreamError::Timeout
            } else {
                UpstreamError::MalformedResponse(format!("Failed to parse Gemini response: {err}"))
            }
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait::async_trait]
impl PromptModel for GeminiPromptModel {
    async fn improve_prompt(
        &self,
        request: &PromptRequest,
    ) -> Result<ImprovePromptOutput, UpstreamError> {
        self.generate(
            "improvePrompt",
            IMPROVE_PROMPT_TEMPLATE,
            request,
            OutputField {
                name: "improvedPrompt",
                description: "The improved text prompt suggested by GenAI.",
            },
        )
        .await
    }

    async fn generate_animation(
        &self,
        request: &PromptRequest,
    ) -> Result<GenerateAnimationOutput, UpstreamError> {
        self.generate(
            "generateAnimation",
            GENERATE_ANIMATION_TEMPLATE,
            request,
            OutputField {
                name: "animationDataUri",
                description: "The animation as a data URI.",
            },
        )
        .await
    }
}

/// The single string field the model must return.
#[derive(Debug, Clone, Copy)]
struct OutputField {
    name: &'static str,
    description: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    fn json_output(text: String, field: OutputField) -> Self {
        Self {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part { text }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: serde_json::json!({
                    "type": "OBJECT",
                    "properties": {
                        field.name: { "type": "STRING", "description": field.description }
                    },
                    "required": [field.name],
                }),
            },
        }
    }
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String, UpstreamError> {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .ok_or_else(|| {
            UpstreamError::MalformedResponse(
                "Gemini API returned no text in the response candidates".into(),
            )
        })
}

/// Parses the model's JSON text, tolerating a Markdown code fence around it.
fn parse_output<T: DeserializeOwned>(raw: &str) -> Result<T, UpstreamError> {
    let trimmed = raw.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(unfenced).map_err(|err| {
        UpstreamError::MalformedResponse(format!("model output is not the expected JSON: {err}"))
    })
}

fn map_transport_error(err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::Timeout
    } else {
        UpstreamError::Transport {
            message: format!("Gemini API request failed: {err}"),
        }
    }
}

fn map_http_error(status: StatusCode, body: String) -> UpstreamError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    if status == StatusCode::GATEWAY_TIMEOUT || status == StatusCode::REQUEST_TIMEOUT {
        return UpstreamError::Timeout;
    }

    UpstreamError::Http {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_asks_for_single_json_field() {
        let body = GenerateContentRequest::json_output(
            "Prompt: cat".into(),
            OutputField {
                name: "improvedPrompt",
                description: "desc",
            },
        );
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Prompt: cat");
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(
            json["generationConfig"]["responseSchema"]["required"][0],
            "improvedPrompt"
        );
    }

    #[test]
    fn test_extracts_first_candidate_text() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"improvedPrompt\":\"x\"}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(
            extract_text_response(response).unwrap(),
            r#"{"improvedPrompt":"x"}"#
        );
    }

    #[test]
    fn test_empty_candidates_is_malformed() {
        let response: GenerateContentResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(matches!(
            extract_text_response(response),
            Err(UpstreamError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_output_passes_data_uri_through() {
        let output: GenerateAnimationOutput =
            parse_output(r#"{"animationDataUri":"data:video/mp4;base64,AAAA"}"#).unwrap();
        assert_eq!(output.animation_data_uri, "data:video/mp4;base64,AAAA");
    }

    #[test]
    fn test_parse_output_strips_code_fence() {
        let output: ImprovePromptOutput =
            parse_output("```json\n{\"improvedPrompt\":\"A fluffy cat\"}\n```").unwrap();
        assert_eq!(output.improved_prompt, "A fluffy cat");
    }

    #[test]
    fn test_parse_output_rejects_prose() {
        let result: Result<ImprovePromptOutput, _> = parse_output("Sure! Here is a prompt.");
        assert!(matches!(result, Err(UpstreamError::MalformedResponse(_))));
    }

    #[test]
    fn test_http_error_mapping() {
        let err = map_http_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#
                .into(),
        );
        assert_eq!(
            err,
            UpstreamError::Http {
                status: 429,
                message: "RESOURCE_EXHAUSTED: Quota exceeded".into(),
            }
        );

        let err = map_http_error(StatusCode::BAD_REQUEST, "plain text".into());
        assert!(matches!(err, UpstreamError::Http { status: 400, .. }));

        assert_eq!(
            map_http_error(StatusCode::GATEWAY_TIMEOUT, String::new()),
            UpstreamError::Timeout
        );
    }

    #[test]
    fn test_from_settings_uses_configured_model() {
        let settings = ModelSettings {
            name: "gemini-test".into(),
            endpoint: "http://localhost:9/models/".into(),
            timeout_secs: 5,
        };
        let model = GeminiPromptModel::from_settings("key", &settings);
        assert_eq!(model.model(), "gemini-test");
        assert_eq!(model.endpoint, "http://localhost:9/models");
    }
}
