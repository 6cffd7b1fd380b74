//! Normalized transcript entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Input from the user.
    Human,
    /// Model output.
    Ai,
    /// Tool invocation result.
    Tool,
    /// Anything the engine produced that fits none of the above.
    Unknown,
}

/// A single normalized transcript entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    #[must_use]
    pub fn human(content: impl Into<String>) -> Self {
        Self::of_kind(MessageKind::Human, content, None)
    }

    #[must_use]
    pub fn ai(content: impl Into<String>) -> Self {
        Self::of_kind(MessageKind::Ai, content, None)
    }

    #[must_use]
    pub fn tool(content: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self::of_kind(MessageKind::Tool, content, Some(tool_name.into()))
    }

    #[must_use]
    pub fn unknown(content: impl Into<String>) -> Self {
        Self::of_kind(MessageKind::Unknown, content, None)
    }

    fn of_kind(kind: MessageKind, content: impl Into<String>, tool_name: Option<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            tool_name,
            timestamp: Utc::now(),
        }
    }
}
