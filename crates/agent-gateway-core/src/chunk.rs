//! Raw stream chunks and emission modes.

use std::fmt;

use crate::value::EngineValue;

/// Emission mode requested from the engine stream.
///
/// Parsing accepts the spellings existing clients send (`messages` for
/// token mode, `updates` for update mode); anything unrecognized is carried
/// through and normalized as `unknown` events rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamMode {
    Token,
    Update,
    Custom,
    /// Unrecognized mode, preserved verbatim.
    Other(String),
}

impl StreamMode {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "token" | "messages" => Self::Token,
            "update" | "updates" => Self::Update,
            "custom" => Self::Custom,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Token => "token",
            Self::Update => "update",
            Self::Custom => "custom",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for StreamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw chunk produced by the engine stream, decoded once at the ingress
/// boundary.
///
/// Token-mode chunks are nominally `(token, metadata)` pairs but may arrive
/// encoded as 1- or 2-element sequences; other modes produce arbitrary
/// values. Downstream consumers never probe shapes beyond this union.
#[derive(Debug, Clone, PartialEq)]
pub enum RawChunk {
    /// A native `(token, metadata)` pair.
    Pair {
        token: EngineValue,
        metadata: EngineValue,
    },
    /// A sequence encoding, possibly of a pair.
    Sequence(Vec<EngineValue>),
    /// Any other value.
    Value(EngineValue),
}

impl RawChunk {
    /// Convenience for a token/metadata pair.
    #[must_use]
    pub fn pair(token: impl Into<EngineValue>, metadata: impl Into<EngineValue>) -> Self {
        Self::Pair {
            token: token.into(),
            metadata: metadata.into(),
        }
    }
}

impl fmt::Display for RawChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pair { token, metadata } => write!(f, "({token}, {metadata})"),
            Self::Sequence(items) => fmt::Display::fmt(&EngineValue::Sequence(items.clone()), f),
            Self::Value(value) => fmt::Display::fmt(value, f),
        }
    }
}
