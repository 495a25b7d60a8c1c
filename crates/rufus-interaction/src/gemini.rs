//! Direct REST client for the Gemini `generateContent` API.
//!
//! Implements the gateway capabilities without any SDK dependency: one-shot
//! text completion, inline-data image description, and conversation handles
//! (see [`crate::chat`]).

use crate::chat::GeminiConversation;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use reqwest::{Client, StatusCode};
use rufus_core::error::{Result, RufusError};
use rufus_core::gateway::{Conversation, LlmGateway};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

// The upstream API imposes no deadline of its own; a stalled call would
// otherwise hold its request handler open indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// The token the vision prompt instructs the model to emit when it cannot
/// recognize a product in the image.
const UNIDENTIFIED_SENTINEL: &str = "CANNOT IDENTIFY";

pub(crate) const ROLE_USER: &str = "user";
pub(crate) const ROLE_MODEL: &str = "model";

/// Client for the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
}

impl GeminiClient {
    /// Creates a new client with the provided API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            api_key: api_key.into(),
        }
    }

    /// Submits contents to `model` and returns the first candidate's text,
    /// or `None` when the response carried no text part.
    pub(crate) async fn generate(&self, model: &str, contents: &[Content]) -> Result<Option<String>> {
        let url = format!(
            "{BASE_URL}/{model}:generateContent?key={api_key}",
            api_key = self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(&GenerateContentRequest { contents })
            .send()
            .await
            .map_err(|err| RufusError::upstream(format!("Gemini API request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read Gemini error body".to_string());
            return Err(classify_api_error(status, &body));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| RufusError::upstream(format!("failed to parse Gemini response: {err}")))?;

        Ok(extract_text(parsed))
    }
}

#[async_trait::async_trait]
impl LlmGateway for GeminiClient {
    async fn complete_text(&self, prompt: &str, model: &str) -> Result<String> {
        let contents = [Content::user_text(prompt)];
        self.generate(model, &contents).await?.ok_or_else(|| {
            RufusError::upstream("Gemini API returned no text in the response candidates")
        })
    }

    async fn describe_image(
        &self,
        bytes: &[u8],
        mime_type: &str,
        prompt: &str,
        model: &str,
    ) -> Result<Option<String>> {
        let content = Content {
            role: ROLE_USER,
            parts: vec![Part::text(prompt), Part::inline_data(mime_type, bytes)],
        };

        let reply = self.generate(model, &[content]).await?;
        Ok(reply.and_then(|text| {
            let description = text.trim().to_string();
            if description.is_empty() || description.to_uppercase().contains(UNIDENTIFIED_SENTINEL)
            {
                None
            } else {
                Some(description)
            }
        }))
    }

    fn open_conversation(&self, model: &str) -> Arc<dyn Conversation> {
        Arc::new(GeminiConversation::new(self.clone(), model))
    }
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: &'a [Content],
}

#[derive(Clone, Serialize)]
pub(crate) struct Content {
    pub(crate) role: &'static str,
    pub(crate) parts: Vec<Part>,
}

impl Content {
    pub(crate) fn user_text(text: &str) -> Self {
        Self {
            role: ROLE_USER,
            parts: vec![Part::text(text)],
        }
    }

    pub(crate) fn model_text(text: &str) -> Self {
        Self {
            role: ROLE_MODEL,
            parts: vec![Part::text(text)],
        }
    }
}

#[derive(Clone, Serialize)]
#[serde(untagged)]
pub(crate) enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl Part {
    pub(crate) fn text(text: &str) -> Self {
        Self::Text {
            text: text.to_string(),
        }
    }

    fn inline_data(mime_type: &str, bytes: &[u8]) -> Self {
        Self::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.to_string(),
                data: BASE64_STANDARD.encode(bytes),
            },
        }
    }
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
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

fn extract_text(response: GenerateContentResponse) -> Option<String> {
    response
        .candidates
        .and_then(|mut candidates| candidates.pop())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
}

/// Types an upstream failure from its HTTP status and error body.
///
/// 401/403 are credential problems. The message scan is a compatibility shim
/// for responses where the status alone does not say so but the error text
/// names the key or a permission denial.
fn classify_api_error(status: StatusCode, body: &str) -> RufusError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.to_string());

    let credential_failure = matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        || mentions_credentials(&message);

    if credential_failure {
        RufusError::upstream_auth(format!("HTTP {status}: {message}"))
    } else {
        RufusError::upstream(format!("HTTP {status}: {message}"))
    }
}

fn mentions_credentials(message: &str) -> bool {
    message.contains("API key")
        || message.contains("PermissionDenied")
        || message.contains("PERMISSION_DENIED")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_takes_first_text_part() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "p1,p2"}]}}]}"#,
        )
        .unwrap();

        assert_eq!(extract_text(response).as_deref(), Some("p1,p2"));
    }

    #[test]
    fn test_extract_text_handles_missing_candidates() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(extract_text(response).is_none());

        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates": [{"content": {"parts": []}}]}"#).unwrap();
        assert!(extract_text(response).is_none());
    }

    #[test]
    fn test_classify_forbidden_status_as_auth() {
        let err = classify_api_error(StatusCode::FORBIDDEN, "anything");
        assert!(err.is_upstream_auth());
    }

    #[test]
    fn test_classify_credential_text_as_auth() {
        let body = r#"{"error": {"message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        let err = classify_api_error(StatusCode::BAD_REQUEST, body);
        assert!(err.is_upstream_auth());

        let err = classify_api_error(StatusCode::BAD_REQUEST, "PERMISSION_DENIED on resource");
        assert!(err.is_upstream_auth());
    }

    #[test]
    fn test_classify_other_failures_as_upstream() {
        let body = r#"{"error": {"message": "model overloaded", "status": "UNAVAILABLE"}}"#;
        let err = classify_api_error(StatusCode::SERVICE_UNAVAILABLE, body);

        assert!(!err.is_upstream_auth());
        assert!(err.to_string().contains("UNAVAILABLE: model overloaded"));
    }

    #[test]
    fn test_inline_data_serializes_with_camel_case_mime() {
        let part = Part::inline_data("image/png", &[1, 2, 3]);
        let value = serde_json::to_value(&part).unwrap();

        assert_eq!(value["inlineData"]["mimeType"], "image/png");
        assert_eq!(value["inlineData"]["data"], BASE64_STANDARD.encode([1, 2, 3]));
    }
}
