//! Canonical event envelope emitted to the transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Origin of a stream chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    /// The top-level reasoning loop.
    Main,
    /// A nested agent, identified by its namespace path.
    Subagent,
}

impl EventSource {
    /// A chunk comes from a subagent iff its namespace path is non-empty.
    #[must_use]
    pub fn from_namespace(namespace: &str) -> Self {
        if namespace.is_empty() {
            Self::Main
        } else {
            Self::Subagent
        }
    }
}

/// Canonical output unit of the gateway.
///
/// Every variant is already transport-safe: payloads have passed through
/// the serialization guard before an event is constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A model token with its generation metadata.
    Token {
        source: EventSource,
        namespace: String,
        content: String,
        metadata: Value,
    },
    /// A node update passed through verbatim.
    Update {
        source: EventSource,
        namespace: String,
        data: Value,
    },
    /// A custom engine event passed through verbatim.
    Custom {
        source: EventSource,
        namespace: String,
        event: Value,
    },
    /// A chunk from an unrecognized emission mode.
    Unknown {
        source: EventSource,
        namespace: String,
        data: Value,
    },
    /// Fatal mid-stream failure; the stream terminates after this.
    Error { content: String },
}

impl Event {
    #[must_use]
    pub fn error(content: impl Into<String>) -> Self {
        Self::Error {
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_derivation_follows_namespace() {
        assert_eq!(EventSource::from_namespace(""), EventSource::Main);
        assert_eq!(
            EventSource::from_namespace("researcher"),
            EventSource::Subagent
        );
        assert_eq!(
            EventSource::from_namespace("researcher:tools"),
            EventSource::Subagent
        );
    }

    #[test]
    fn events_serialize_with_a_type_tag() {
        let event = Event::Token {
            source: EventSource::Main,
            namespace: String::new(),
            content: "hello".into(),
            metadata: serde_json::json!({"model": "x"}),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "token");
        assert_eq!(json["source"], "main");
        assert_eq!(json["content"], "hello");
    }

    #[test]
    fn error_events_carry_only_content() {
        let json = serde_json::to_value(Event::error("boom")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "error", "content": "boom"}));
    }
}
