//! Transport-safe conversion of engine result trees.

use std::fmt;

use serde_json::{Map, Value};

/// Recursion limit past which the remainder of a tree is stringified.
const MAX_DEPTH: usize = 64;

/// A value crossing the execution-engine boundary.
///
/// The engine is weakly typed: results and stream chunks may contain
/// primitives, containers, domain message objects, or foreign objects the
/// gateway only knows how to display. Decoding into this union happens once
/// at the boundary; everything downstream is total over it.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Sequence(Vec<EngineValue>),
    Mapping(Vec<(String, EngineValue)>),
    /// A message-like object exposing a content-bearing shape.
    Message {
        role: Option<String>,
        content: String,
        name: Option<String>,
    },
    /// A foreign object the gateway will not walk into; display form only.
    Opaque(String),
}

impl EngineValue {
    /// Empty mapping, the default metadata shape.
    #[must_use]
    pub const fn empty_mapping() -> Self {
        Self::Mapping(Vec::new())
    }

    /// The `content` field of a message-like value.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Message { content, .. } => Some(content),
            _ => None,
        }
    }
}

impl From<&str> for EngineValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for EngineValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Value> for EngineValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Sequence(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                Self::Mapping(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl fmt::Display for EngineValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Number(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::Sequence(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Mapping(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Self::Message { content, .. } => f.write_str(content),
            Self::Opaque(repr) => f.write_str(repr),
        }
    }
}

/// Convert an arbitrary engine value into a transport-safe JSON tree.
///
/// Total over any input: primitives pass through, containers recurse,
/// message-like objects become `{type, content, name}`, opaque objects and
/// anything nested beyond the recursion limit become their display string.
#[must_use]
pub fn sanitize(value: &EngineValue) -> Value {
    sanitize_at(value, 0)
}

fn sanitize_at(value: &EngineValue, depth: usize) -> Value {
    if depth >= MAX_DEPTH {
        return Value::String(value.to_string());
    }
    match value {
        EngineValue::Null => Value::Null,
        EngineValue::Bool(b) => Value::Bool(*b),
        EngineValue::Number(n) => Value::Number(n.clone()),
        EngineValue::String(s) => Value::String(s.clone()),
        EngineValue::Sequence(items) => {
            Value::Array(items.iter().map(|v| sanitize_at(v, depth + 1)).collect())
        }
        EngineValue::Mapping(entries) => {
            let mut map = Map::with_capacity(entries.len());
            for (key, entry) in entries {
                map.insert(key.clone(), sanitize_at(entry, depth + 1));
            }
            Value::Object(map)
        }
        EngineValue::Message {
            role,
            content,
            name,
        } => serde_json::json!({
            "type": role.as_deref().unwrap_or("unknown"),
            "content": content,
            "name": name,
        }),
        EngineValue::Opaque(repr) => Value::String(repr.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_pass_through() {
        assert_eq!(sanitize(&EngineValue::Null), Value::Null);
        assert_eq!(sanitize(&EngineValue::Bool(true)), Value::Bool(true));
        assert_eq!(
            sanitize(&EngineValue::String("hi".into())),
            Value::String("hi".into())
        );
    }

    #[test]
    fn containers_recurse() {
        let value = EngineValue::Mapping(vec![(
            "messages".into(),
            EngineValue::Sequence(vec![EngineValue::String("hello".into())]),
        )]);
        assert_eq!(
            sanitize(&value),
            serde_json::json!({"messages": ["hello"]})
        );
    }

    #[test]
    fn messages_become_typed_objects() {
        let value = EngineValue::Message {
            role: Some("ai".into()),
            content: "done".into(),
            name: None,
        };
        assert_eq!(
            sanitize(&value),
            serde_json::json!({"type": "ai", "content": "done", "name": null})
        );
    }

    #[test]
    fn opaque_values_are_stringified() {
        let value = EngineValue::Opaque("<ToolHandle calculator>".into());
        assert_eq!(
            sanitize(&value),
            Value::String("<ToolHandle calculator>".into())
        );
    }

    #[test]
    fn over_deep_trees_terminate_via_stringification() {
        let mut value = EngineValue::String("leaf".into());
        for _ in 0..200 {
            value = EngineValue::Sequence(vec![value]);
        }
        // Must not recurse unboundedly; the remainder collapses to a string.
        let sanitized = sanitize(&value);
        let mut depth = 0;
        let mut cursor = &sanitized;
        while let Value::Array(items) = cursor {
            cursor = &items[0];
            depth += 1;
        }
        assert!(cursor.is_string());
        assert!(depth <= MAX_DEPTH);
    }

    #[test]
    fn display_renders_nested_values() {
        let value = EngineValue::Sequence(vec![
            EngineValue::String("a".into()),
            EngineValue::Mapping(vec![("k".into(), EngineValue::Null)]),
        ]);
        assert_eq!(value.to_string(), "[a, {k: null}]");
    }
}
