//! Groq chat-completions provider (OpenAI-compatible wire format)

use super::types::{ChatMessage, ChatRole};
use super::{ChatService, LlmError, LlmErrorKind};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";
const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Groq service implementation
pub struct GroqService {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GroqService {
    pub fn new(api_key: String, base_url: Option<&str>) -> Self {
        let base_url = base_url
            .map_or(DEFAULT_BASE_URL, |u| u.trim_end_matches('/'))
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key,
            base_url,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    fn classify_status(status: StatusCode) -> LlmErrorKind {
        match status {
            StatusCode::BAD_REQUEST => LlmErrorKind::InvalidRequest,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmErrorKind::Auth,
            StatusCode::TOO_MANY_REQUESTS => LlmErrorKind::RateLimit,
            StatusCode::SERVICE_UNAVAILABLE => LlmErrorKind::Overloaded,
            s if s.is_server_error() => LlmErrorKind::ServerError,
            _ => LlmErrorKind::Unknown,
        }
    }
}

#[async_trait]
impl ChatService for GroqService {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let request = GroqRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    LlmError::network(e.to_string())
                } else {
                    LlmError::unknown(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::new(
                Self::classify_status(status),
                format!("upstream returned {status}: {body}"),
            ));
        }

        let parsed: GroqResponse = response
            .json()
            .await
            .map_err(|e| LlmError::unknown(format!("malformed upstream response: {e}")))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct GroqRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct GroqResponse {
    #[serde(default)]
    choices: Vec<GroqChoice>,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct GroqChoiceMessage {
    content: Option<String>,
}
