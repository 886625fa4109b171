//! Message Model
//!
//! Persisted conversation messages. Content is stored as the JSON list of
//! provider content blocks so history replay is lossless.

use serde::{Deserialize, Serialize};

use crate::services::llm::types::MessageContent;
use crate::utils::error::{AppError, AppResult};

/// Role of a stored message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoredRole {
    User,
    Assistant,
    /// Tool results; replayed to the provider as user-role messages
    Tool,
}

impl StoredRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            "tool" => Some(Self::Tool),
            _ => None,
        }
    }
}

/// A single append-only conversation message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub id: String,
    pub project_id: String,
    pub role: StoredRole,
    /// JSON-serialized `Vec<MessageContent>`
    pub content: String,
    /// Strictly increasing per project; assigned on append
    pub ordinal: i64,
    pub created_at: String,
}

impl StoredMessage {
    /// Deserialize the stored content blocks
    pub fn content_blocks(&self) -> AppResult<Vec<MessageContent>> {
        serde_json::from_str(&self.content).map_err(AppError::from)
    }

    /// Concatenated text blocks; None when the message is pure tool plumbing
    pub fn visible_text(&self) -> Option<String> {
        let blocks = self.content_blocks().ok()?;
        let parts: Vec<&str> = blocks
            .iter()
            .filter_map(|block| match block {
                MessageContent::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_with(blocks: &[MessageContent], role: StoredRole) -> StoredMessage {
        StoredMessage {
            id: "m1".to_string(),
            project_id: "p1".to_string(),
            role,
            content: serde_json::to_string(blocks).unwrap(),
            ordinal: 1,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_role_round_trip() {
        for role in [StoredRole::User, StoredRole::Assistant, StoredRole::Tool] {
            assert_eq!(StoredRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(StoredRole::parse("system"), None);
    }

    #[test]
    fn test_visible_text_joins_text_blocks() {
        let msg = message_with(
            &[
                MessageContent::Text {
                    text: "one".to_string(),
                },
                MessageContent::ToolUse {
                    id: "t".to_string(),
                    name: "read_file".to_string(),
                    input: serde_json::json!({}),
                },
                MessageContent::Text {
                    text: "two".to_string(),
                },
            ],
            StoredRole::Assistant,
        );
        assert_eq!(msg.visible_text().as_deref(), Some("one\ntwo"));
    }

    #[test]
    fn test_visible_text_none_for_tool_plumbing() {
        let msg = message_with(
            &[MessageContent::ToolResult {
                tool_use_id: "t".to_string(),
                content: "ok".to_string(),
                is_error: false,
            }],
            StoredRole::Tool,
        );
        assert_eq!(msg.visible_text(), None);
    }
}
