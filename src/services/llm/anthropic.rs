//! Anthropic Provider
//!
//! Implements the provider trait against the Anthropic Messages API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::provider::{missing_api_key_error, parse_http_error, LlmProvider};
use super::types::{
    LlmError, LlmResponse, LlmResult, Message, MessageContent, MessageRole, ProviderConfig,
    StopReason, ToolCall, ToolDefinition, UsageStats,
};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const RATE_LIMIT_RETRY_DELAY: Duration = Duration::from_secs(5);

pub struct AnthropicProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self) -> String {
        match &self.config.base_url {
            Some(base) => format!("{}/v1/messages", base.trim_end_matches('/')),
            None => ANTHROPIC_API_URL.to_string(),
        }
    }

    fn api_key(&self) -> LlmResult<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| missing_api_key_error("Anthropic"))
    }

    fn build_request_body(
        &self,
        messages: &[Message],
        system: Option<&str>,
        tools: &[ToolDefinition],
    ) -> Value {
        let mut body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": messages.iter().map(message_to_wire).collect::<Vec<_>>(),
        });

        if let Some(system) = system {
            // Mark the system preamble cacheable; it is identical across rounds
            body["system"] = json!([{
                "type": "text",
                "text": system,
                "cache_control": { "type": "ephemeral" },
            }]);
        }

        if let Some(temperature) = self.config.temperature {
            body["temperature"] = json!(temperature);
        }

        if !tools.is_empty() {
            let mut wire_tools: Vec<Value> = tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "description": t.description,
                        "input_schema": t.input_schema,
                    })
                })
                .collect();
            if let Some(last) = wire_tools.last_mut() {
                last["cache_control"] = json!({ "type": "ephemeral" });
            }
            body["tools"] = Value::Array(wire_tools);
        }

        body
    }

    async fn send_once(&self, body: &Value) -> LlmResult<LlmResponse> {
        let response = self
            .client
            .post(self.api_url())
            .header("x-api-key", self.api_key()?)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(parse_http_error(status.as_u16(), &text, "Anthropic"));
        }

        let parsed: WireResponse = serde_json::from_str(&text)
            .map_err(|e| LlmError::Parse(format!("Invalid Anthropic response: {e}")))?;
        Ok(parsed.into_response())
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Vec<ToolDefinition>,
    ) -> LlmResult<LlmResponse> {
        let body = self.build_request_body(&messages, system.as_deref(), &tools);
        match self.send_once(&body).await {
            Err(LlmError::RateLimited(message)) => {
                tracing::warn!(%message, "rate limited, retrying once");
                tokio::time::sleep(RATE_LIMIT_RETRY_DELAY).await;
                self.send_once(&body).await
            }
            other => other,
        }
    }

    async fn health_check(&self) -> LlmResult<()> {
        self.api_key()?;
        Ok(())
    }
}

fn message_to_wire(message: &Message) -> Value {
    let role = match message.role {
        MessageRole::Assistant => "assistant",
        MessageRole::User => "user",
    };
    let content: Vec<Value> = message
        .content
        .iter()
        .map(|block| match block {
            MessageContent::Text { text } => json!({ "type": "text", "text": text }),
            MessageContent::ToolUse { id, name, input } => json!({
                "type": "tool_use", "id": id, "name": name, "input": input,
            }),
            MessageContent::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => json!({
                "type": "tool_result",
                "tool_use_id": tool_use_id,
                "content": content,
                "is_error": is_error,
            }),
        })
        .collect();
    json!({ "role": role, "content": content })
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    content: Vec<WireBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    usage: WireUsage,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize, Default)]
struct WireUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl WireResponse {
    fn into_response(self) -> LlmResponse {
        let mut text_parts = Vec::new();
        let mut tool_calls = Vec::new();
        for block in self.content {
            match block {
                WireBlock::Text { text } => text_parts.push(text),
                WireBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall {
                    id,
                    name,
                    arguments: input,
                }),
                WireBlock::Unknown => {}
            }
        }
        let stop_reason = self.stop_reason.as_deref().map(|reason| match reason {
            "end_turn" => StopReason::EndTurn,
            "max_tokens" => StopReason::MaxTokens,
            "stop_sequence" => StopReason::StopSequence,
            "tool_use" => StopReason::ToolUse,
            _ => StopReason::Other,
        });
        LlmResponse {
            content: if text_parts.is_empty() {
                None
            } else {
                Some(text_parts.join("\n"))
            },
            tool_calls,
            stop_reason,
            usage: UsageStats {
                input_tokens: self.usage.input_tokens,
                output_tokens: self.usage.output_tokens,
            },
            model: self.model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_provider() -> AnthropicProvider {
        AnthropicProvider::new(ProviderConfig {
            api_key: Some("sk-test".to_string()),
            ..ProviderConfig::default()
        })
    }

    #[test]
    fn test_build_request_body_basic() {
        let provider = test_provider();
        let messages = vec![Message::user("hello")];
        let body = provider.build_request_body(&messages, Some("be helpful"), &[]);

        assert_eq!(body["model"], provider.config.model);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"][0]["text"], "hello");
        assert_eq!(body["system"][0]["text"], "be helpful");
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_build_request_body_tool_cache_marker() {
        let provider = test_provider();
        let tools = vec![
            ToolDefinition {
                name: "a".to_string(),
                description: "first".to_string(),
                input_schema: super::super::types::ParameterSchema::object(vec![], vec![]),
            },
            ToolDefinition {
                name: "b".to_string(),
                description: "second".to_string(),
                input_schema: super::super::types::ParameterSchema::object(vec![], vec![]),
            },
        ];
        let body = provider.build_request_body(&[Message::user("x")], None, &tools);
        assert!(body["tools"][0].get("cache_control").is_none());
        assert_eq!(body["tools"][1]["cache_control"]["type"], "ephemeral");
    }

    #[test]
    fn test_tool_result_goes_out_as_user_role() {
        let wire = message_to_wire(&Message::tool_result("toolu_1", "ok", false));
        assert_eq!(wire["role"], "user");
        assert_eq!(wire["content"][0]["type"], "tool_result");
        assert_eq!(wire["content"][0]["tool_use_id"], "toolu_1");
    }

    #[test]
    fn test_parse_response_with_tool_use() {
        let raw = r#"{
            "content": [
                {"type": "text", "text": "checking"},
                {"type": "tool_use", "id": "toolu_1", "name": "read_file", "input": {"path": "a.txt"}}
            ],
            "stop_reason": "tool_use",
            "model": "claude-sonnet-4-20250514",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }"#;
        let parsed: WireResponse = serde_json::from_str(raw).unwrap();
        let response = parsed.into_response();
        assert_eq!(response.content.as_deref(), Some("checking"));
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].name, "read_file");
        assert_eq!(response.stop_reason, Some(StopReason::ToolUse));
        assert_eq!(response.usage.input_tokens, 10);
    }

    #[test]
    fn test_parse_response_ignores_unknown_blocks() {
        let raw = r#"{
            "content": [
                {"type": "thinking", "thinking": "hmm"},
                {"type": "text", "text": "answer"}
            ],
            "stop_reason": "end_turn",
            "model": "m",
            "usage": {}
        }"#;
        let parsed: WireResponse = serde_json::from_str(raw).unwrap();
        let response = parsed.into_response();
        assert_eq!(response.content.as_deref(), Some("answer"));
        assert!(!response.has_tool_calls());
    }

    #[tokio::test]
    async fn test_health_check_requires_api_key() {
        let provider = AnthropicProvider::new(ProviderConfig::default());
        assert!(matches!(
            provider.health_check().await,
            Err(LlmError::MissingApiKey(_))
        ));
        assert!(test_provider().health_check().await.is_ok());
    }

    #[test]
    fn test_base_url_override() {
        let provider = AnthropicProvider::new(ProviderConfig {
            base_url: Some("http://localhost:9999/".to_string()),
            ..ProviderConfig::default()
        });
        assert_eq!(provider.api_url(), "http://localhost:9999/v1/messages");
    }
}
