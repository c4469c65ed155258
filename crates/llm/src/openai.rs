use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::errors::CompletionError;
use crate::transport::CompletionTransport;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Read once at startup; a missing key fails the first request, not construction.
    pub api_key: Option<String>,
    pub api_base: String,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Chat-completions transport for OpenAI-compatible endpoints.
pub struct OpenAiTransport {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiTransport {
    pub fn new(config: OpenAiConfig) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(CompletionError::Client)?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl CompletionTransport for OpenAiTransport {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, CompletionError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(CompletionError::MissingCredential)?;

        let body = ChatCompletionRequest {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .map_err(|err| classify_transport_error(model, err))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<response unavailable>".to_string());
            return Err(classify_status(model, status, &text));
        }

        let response: ChatCompletionResponse =
            response
                .json()
                .await
                .map_err(|err| CompletionError::InvalidResponse {
                    model: model.to_string(),
                    message: err.to_string(),
                })?;

        if let Some(usage) = &response.usage {
            debug!(
                target: "openai",
                model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion usage"
            );
        }

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_ref())
            .and_then(ChatCompletionContent::as_text)
            .ok_or_else(|| CompletionError::InvalidResponse {
                model: model.to_string(),
                message: "response missing message content".to_string(),
            })
    }
}

/// Maps a non-success HTTP status onto the retryable/fatal split.
///
/// 408, 409, 429 and every 5xx are transient; any other status is fatal.
pub(crate) fn classify_status(model: &str, status: StatusCode, body: &str) -> CompletionError {
    let message = api_error_message(body);
    let transient = status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::CONFLICT
        || status.is_server_error();
    if transient {
        CompletionError::Transient {
            model: model.to_string(),
            status: Some(status.as_u16()),
            message,
        }
    } else {
        CompletionError::rejected(model, status.as_u16(), message)
    }
}

fn classify_transport_error(model: &str, err: reqwest::Error) -> CompletionError {
    if err.is_builder() {
        return CompletionError::Client(err);
    }
    // Timeouts, refused connections and dropped streams are worth another try.
    CompletionError::transient(model, err.to_string())
}

fn api_error_message(raw: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(raw) {
        if let Some(message) = envelope.error.message {
            return message.trim().to_string();
        }
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        "<empty body>".to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
    #[serde(default)]
    usage: Option<ChatCompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: Option<ChatCompletionContent>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChatCompletionContent {
    Text(String),
    Parts(Vec<ChatCompletionPart>),
}

impl ChatCompletionContent {
    fn as_text(&self) -> Option<String> {
        match self {
            ChatCompletionContent::Text(value) => Some(value.clone()),
            ChatCompletionContent::Parts(parts) => {
                let text = parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("\n");
                if text.is_empty() {
                    None
                } else {
                    Some(text)
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ApiErrorMessage {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limits_and_server_faults_are_transient() {
        for code in [429u16, 500, 502, 503] {
            let status = StatusCode::from_u16(code).expect("status");
            assert!(classify_status("m", status, "").is_transient(), "{code}");
        }
    }

    #[test]
    fn client_errors_are_fatal() {
        for code in [400u16, 401, 403, 404, 422] {
            let status = StatusCode::from_u16(code).expect("status");
            let err = classify_status("m", status, "");
            assert!(
                matches!(err, CompletionError::Rejected { status, .. } if status == code),
                "{code}"
            );
        }
    }

    #[test]
    fn api_error_envelope_message_is_extracted() {
        let body = r#"{"error": {"message": " Rate limit reached ", "type": "requests"}}"#;
        let err = classify_status("gpt-4o-mini", StatusCode::TOO_MANY_REQUESTS, body);
        match err {
            CompletionError::Transient { message, status, .. } => {
                assert_eq!(message, "Rate limit reached");
                assert_eq!(status, Some(429));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(api_error_message("plain failure"), "plain failure");
    }

    #[test]
    fn content_parts_are_joined() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":[{"type":"text","text":"a"},{"type":"text","text":"b"}]}}]}"#,
        )
        .expect("response");
        let text = response.choices[0]
            .message
            .content
            .as_ref()
            .and_then(ChatCompletionContent::as_text);
        assert_eq!(text.as_deref(), Some("a\nb"));
    }

    #[tokio::test]
    async fn missing_key_fails_at_first_use() {
        let transport = OpenAiTransport::new(OpenAiConfig::default()).expect("transport");
        let err = transport
            .complete("gpt-4o-mini", "hello")
            .await
            .expect_err("no key");
        assert!(matches!(err, CompletionError::MissingCredential));
    }
}
