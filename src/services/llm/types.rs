//! LLM Wire Types
//!
//! Shared types for the provider trait and its implementations: message and
//! content-block shapes, tool schemas, and the provider error type.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Provider connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API key; falls back to the ANTHROPIC_API_KEY environment variable
    pub api_key: Option<String>,
    pub model: String,
    /// Override the API base URL (for proxies)
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: None,
            max_tokens: 8192,
            temperature: None,
        }
    }
}

/// Role of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A single content block within a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        is_error: bool,
    },
}

/// A conversation message as sent to the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: Vec<MessageContent>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: vec![MessageContent::Text { text: text.into() }],
        }
    }

    /// Tool results travel back to the provider as user-role messages
    pub fn tool_result(
        tool_use_id: impl Into<String>,
        content: impl Into<String>,
        is_error: bool,
    ) -> Self {
        Self {
            role: MessageRole::User,
            content: vec![MessageContent::ToolResult {
                tool_use_id: tool_use_id.into(),
                content: content.into(),
                is_error,
            }],
        }
    }

}

/// JSON-schema fragment describing tool parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, ParameterSchema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ParameterSchema>>,
}

impl ParameterSchema {
    pub fn string(description: &str) -> Self {
        Self {
            schema_type: "string".to_string(),
            description: Some(description.to_string()),
            properties: None,
            required: None,
            items: None,
        }
    }

    pub fn integer(description: &str) -> Self {
        Self {
            schema_type: "integer".to_string(),
            description: Some(description.to_string()),
            properties: None,
            required: None,
            items: None,
        }
    }

    pub fn array_of(items: ParameterSchema, description: &str) -> Self {
        Self {
            schema_type: "array".to_string(),
            description: Some(description.to_string()),
            properties: None,
            required: None,
            items: Some(Box::new(items)),
        }
    }

    pub fn object(properties: Vec<(&str, ParameterSchema)>, required: Vec<&str>) -> Self {
        Self {
            schema_type: "object".to_string(),
            description: None,
            properties: Some(
                properties
                    .into_iter()
                    .map(|(name, schema)| (name.to_string(), schema))
                    .collect(),
            ),
            required: Some(required.into_iter().map(String::from).collect()),
            items: None,
        }
    }
}

/// A tool the model may call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: ParameterSchema,
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// Token usage reported by the provider
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UsageStats {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    ToolUse,
    Other,
}

/// A complete (non-streaming) provider response
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub stop_reason: Option<StopReason>,
    pub usage: UsageStats,
    pub model: String,
}

impl LlmResponse {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Classify the response for the turn loop
    pub fn into_turn(self) -> AssistantTurn {
        if self.tool_calls.is_empty() {
            AssistantTurn::FinalText(self.content.unwrap_or_default())
        } else {
            AssistantTurn::ToolCalls {
                text: self.content,
                calls: self.tool_calls,
            }
        }
    }
}

/// The two shapes an assistant reply can take. Tagged so the turn loop's
/// transition match is exhaustive.
#[derive(Debug, Clone)]
pub enum AssistantTurn {
    /// The turn is complete; this is the answer for the user
    FinalText(String),
    /// The model wants tool results before answering
    ToolCalls {
        text: Option<String>,
        calls: Vec<ToolCall>,
    },
}

/// Provider-level failures
#[derive(Debug)]
pub enum LlmError {
    MissingApiKey(String),
    RateLimited(String),
    Api { status: u16, message: String },
    Network(String),
    Parse(String),
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingApiKey(msg) => write!(f, "Missing API key: {msg}"),
            Self::RateLimited(msg) => write!(f, "Rate limited: {msg}"),
            Self::Api { status, message } => write!(f, "API error ({status}): {message}"),
            Self::Network(msg) => write!(f, "Network error: {msg}"),
            Self::Parse(msg) => write!(f, "Parse error: {msg}"),
        }
    }
}

impl std::error::Error for LlmError {}

pub type LlmResult<T> = Result<T, LlmError>;
