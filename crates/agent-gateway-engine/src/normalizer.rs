//! Normalization of raw engine chunks into canonical events.

use std::time::Duration;

use futures::future;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::{Map, Value};

use agent_gateway_core::{
    ChunkStream, EngineError, EngineValue, Event, EventSource, RawChunk, StreamMode, sanitize,
};

/// Normalizes raw stream chunks into canonical [`Event`]s.
///
/// Total over arbitrary chunk shapes: a token chunk that matches no known
/// encoding degrades to a stringified fallback instead of failing the
/// stream, and empty tokens are suppressed outright.
#[derive(Debug, Clone)]
pub struct EventNormalizer {
    mode: StreamMode,
}

impl EventNormalizer {
    #[must_use]
    pub const fn new(mode: StreamMode) -> Self {
        Self { mode }
    }

    /// Normalize one chunk.
    ///
    /// Returns `None` when the chunk is suppressed (token mode, empty
    /// content). Never fails.
    #[must_use]
    pub fn normalize(&self, namespace: &str, chunk: &RawChunk) -> Option<Event> {
        let source = EventSource::from_namespace(namespace);
        match &self.mode {
            StreamMode::Token => normalize_token(source, namespace, chunk),
            StreamMode::Update => Some(Event::Update {
                source,
                namespace: namespace.to_string(),
                data: sanitize_chunk(chunk),
            }),
            StreamMode::Custom => Some(Event::Custom {
                source,
                namespace: namespace.to_string(),
                event: sanitize_chunk(chunk),
            }),
            StreamMode::Other(_) => Some(Event::Unknown {
                source,
                namespace: namespace.to_string(),
                data: sanitize_chunk(chunk),
            }),
        }
    }
}

fn normalize_token(source: EventSource, namespace: &str, chunk: &RawChunk) -> Option<Event> {
    let Some((token, metadata)) = split_token_chunk(chunk) else {
        return fallback_token(source, namespace, chunk);
    };

    let content = token
        .content()
        .map_or_else(|| token.to_string(), ToString::to_string);
    if content.is_empty() {
        // Empty tokens carry no information.
        return None;
    }

    Some(Event::Token {
        source,
        namespace: namespace.to_string(),
        content,
        metadata: normalize_metadata(metadata),
    })
}

/// Split a token-mode chunk into `(token, metadata)`.
///
/// A sequence encoding takes element 0 as the token and element 1 (or an
/// empty mapping if absent) as the metadata. Anything that is neither a
/// pair nor a non-empty sequence has no token shape at all.
fn split_token_chunk(chunk: &RawChunk) -> Option<(EngineValue, EngineValue)> {
    match chunk {
        RawChunk::Pair { token, metadata } => Some((token.clone(), metadata.clone())),
        RawChunk::Sequence(items) => {
            let token = items.first()?.clone();
            let metadata = items
                .get(1)
                .cloned()
                .unwrap_or_else(EngineValue::empty_mapping);
            Some((token, metadata))
        }
        RawChunk::Value(_) => None,
    }
}

/// Last-resort token handling: stringify the raw chunk, emit only if that
/// leaves anything to say.
fn fallback_token(source: EventSource, namespace: &str, chunk: &RawChunk) -> Option<Event> {
    let content = chunk.to_string();
    if content.is_empty() {
        return None;
    }
    tracing::debug!("token chunk matched no known encoding, stringifying");
    Some(Event::Token {
        source,
        namespace: namespace.to_string(),
        content,
        metadata: Value::Object(Map::new()),
    })
}

/// Normalize metadata: mappings pass through, sequences become mappings
/// keyed by position, everything else is stringified.
fn normalize_metadata(metadata: EngineValue) -> Value {
    match metadata {
        EngineValue::Mapping(_) => sanitize(&metadata),
        EngineValue::Sequence(items) => {
            let mut map = Map::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                map.insert(format!("item_{index}"), sanitize(item));
            }
            Value::Object(map)
        }
        other => Value::String(other.to_string()),
    }
}

fn sanitize_chunk(chunk: &RawChunk) -> Value {
    match chunk {
        RawChunk::Pair { token, metadata } => {
            Value::Array(vec![sanitize(token), sanitize(metadata)])
        }
        RawChunk::Sequence(items) => Value::Array(items.iter().map(sanitize).collect()),
        RawChunk::Value(value) => sanitize(value),
    }
}

/// Adapt an engine chunk stream into a canonical event stream.
///
/// Events are forwarded in production order with no buffering. An engine
/// error (or an idle gap exceeding `idle_timeout`) surfaces as a single
/// error event, after which the stream ends. Dropping the returned stream
/// drops the underlying chunk stream, cancelling production.
#[must_use]
pub fn normalize_stream(
    normalizer: EventNormalizer,
    chunks: ChunkStream,
    idle_timeout: Option<Duration>,
) -> BoxStream<'static, Event> {
    let chunks: ChunkStream = match idle_timeout {
        Some(limit) => tokio_stream::StreamExt::timeout(chunks, limit)
            .map(|item| match item {
                Ok(inner) => inner,
                Err(_) => Err(EngineError::StreamTimeout),
            })
            .boxed(),
        None => chunks,
    };

    chunks
        .scan(false, move |failed, item| {
            if *failed {
                return future::ready(None);
            }
            let out = match item {
                Ok((namespace, chunk)) => normalizer.normalize(&namespace, &chunk),
                Err(e) => {
                    *failed = true;
                    tracing::error!("engine stream failed: {e}");
                    Some(Event::error(e.to_string()))
                }
            };
            future::ready(Some(out))
        })
        .filter_map(future::ready)
        .boxed()
}
