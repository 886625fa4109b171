//! LLM Provider Trait
//!
//! The seam between the turn loop and concrete LLM backends.

use async_trait::async_trait;

use super::types::{LlmError, LlmResponse, LlmResult, Message, ToolDefinition};

/// A blocking (request/response) LLM backend
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    /// Send the conversation and tool schemas, returning the full reply
    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Vec<ToolDefinition>,
    ) -> LlmResult<LlmResponse>;

    /// Cheap readiness probe (configuration only, no network round trip)
    async fn health_check(&self) -> LlmResult<()>;
}

pub fn missing_api_key_error(provider: &str) -> LlmError {
    LlmError::MissingApiKey(format!("{provider} API key is not configured"))
}

/// Map an HTTP error response to an LlmError, pulling the provider's own
/// error message out of the body when it is JSON.
pub fn parse_http_error(status: u16, body: &str, provider: &str) -> LlmError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.chars().take(500).collect());

    match status {
        401 | 403 => LlmError::Api {
            status,
            message: format!("{provider} authentication failed: {message}"),
        },
        429 => LlmError::RateLimited(message),
        _ => LlmError::Api { status, message },
    }
}
