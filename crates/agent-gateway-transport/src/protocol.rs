//! Wire protocol for client-server communication.
//!
//! The streaming contract is a sequence of SSE lines `data: <json event>`
//! terminated by the `[DONE]` sentinel; a fatal mid-stream failure emits one
//! error event before the terminator.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use agent_gateway_core::Event;

/// Stream terminator sentinel.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Request to run a goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    pub goal: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Structured reply to a synchronous run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentReply {
    #[must_use]
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    #[must_use]
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// JSON payload of one event.
///
/// Event payloads are transport-safe by construction; if encoding fails
/// anyway the payload degrades to an error event rather than dropping the
/// frame.
#[must_use]
pub fn event_json(event: &Event) -> String {
    serde_json::to_string(event).unwrap_or_else(|e| {
        serde_json::json!({"type": "error", "content": format!("failed to encode event: {e}")})
            .to_string()
    })
}

/// Encode one event as an SSE data frame.
#[must_use]
pub fn event_frame(event: &Event) -> String {
    format!("data: {}\n\n", event_json(event))
}

/// Encode the terminator frame.
#[must_use]
pub fn done_frame() -> String {
    format!("data: {DONE_SENTINEL}\n\n")
}

/// Encode a fatal error frame.
#[must_use]
pub fn error_frame(message: &str) -> String {
    event_frame(&Event::error(message))
}
