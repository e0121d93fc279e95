//! Chat-completion client abstraction
//!
//! Provides a common interface over the upstream completion API plus the
//! bounded-retry wrapper used by the classifier and the chat relay.

mod error;
mod groq;
mod types;

pub use error::{LlmError, LlmErrorKind};
pub use groq::{GroqService, DEFAULT_MODEL};
pub use types::{normalize_role, ChatMessage, ChatRole};

use async_trait::async_trait;
use std::time::Duration;

/// Common interface for chat-completion providers
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Run a single completion over the given messages, returning the
    /// assistant's text content (empty if the upstream returned none).
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Retry policy for upstream completion calls.
///
/// Backoff is linear: the just-failed attempt index times the delay unit.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_unit: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.delay_unit * attempt
    }
}

/// Run a completion with bounded retries.
///
/// Only error kinds classified as retryable are retried (the upstream
/// "service overloaded" signal); any other failure aborts immediately and
/// surfaces to the caller.
pub async fn complete_with_retry(
    service: &dyn ChatService,
    messages: &[ChatMessage],
    policy: &RetryPolicy,
) -> Result<String, LlmError> {
    let mut attempt = 1;
    loop {
        match service.complete(messages).await {
            Ok(text) => return Ok(text),
            Err(err) if err.kind.is_retryable() && attempt < policy.max_attempts => {
                tracing::warn!(
                    model = %service.model_id(),
                    attempt,
                    error = %err,
                    "completion failed, retrying"
                );
                tokio::time::sleep(policy.backoff(attempt)).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
