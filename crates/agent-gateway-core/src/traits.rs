//! Trait seams between the gateway, the execution engine, and memory.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use thiserror::Error;

use crate::chunk::{RawChunk, StreamMode};
use crate::context::Identity;
use crate::message::ChatMessage;
use crate::value::EngineValue;

/// Execution-engine error.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invocation failed: {0}")]
    InvokeFailed(String),
    #[error("Stream failed: {0}")]
    StreamFailed(String),
    #[error("Stream stalled past the idle timeout")]
    StreamTimeout,
}

/// Durable-store error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("Store error: {0}")]
    Internal(String),
}

/// Item yielded by an engine stream: the emitting namespace and the raw chunk.
pub type ChunkStream = BoxStream<'static, Result<(String, RawChunk), EngineError>>;

/// The external goal-driven execution engine.
///
/// The gateway treats the engine as a black box: reasoning, planning and
/// tool dispatch all happen behind this seam. Identity is passed explicitly
/// to every call; implementations must not capture it from ambient state.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Run a goal to completion and return the final result tree.
    ///
    /// # Errors
    /// Returns an error if the engine cannot complete the goal.
    async fn invoke(&self, goal: &str, identity: &Identity) -> Result<EngineValue, EngineError>;

    /// Stream a goal's execution as `(namespace, chunk)` items.
    ///
    /// `subgraphs` requests events from nested agents; their chunks carry a
    /// non-empty namespace. Dropping the stream cancels production.
    fn stream(
        &self,
        goal: &str,
        mode: &StreamMode,
        subgraphs: bool,
        identity: &Identity,
    ) -> ChunkStream;
}

/// A memory scope the engine reads and writes during execution.
#[async_trait]
pub trait MemoryBackend: Send + Sync {
    /// Read the value at `path`, if any.
    ///
    /// # Errors
    /// Returns an error if the underlying store fails.
    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Write `value` at `path`, replacing any existing value.
    ///
    /// # Errors
    /// Returns an error if the underlying store fails.
    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Delete the value at `path`; returns whether it existed.
    ///
    /// # Errors
    /// Returns an error if the underlying store fails.
    async fn delete(&self, path: &str) -> Result<bool, StoreError>;
}

/// Hook invoked after each reasoning step with the running transcript.
///
/// Hooks receive the identity as an explicit parameter on every call; there
/// is no shared mutable context to capture it from.
#[async_trait]
pub trait StepHook: Send + Sync {
    async fn after_step(&self, identity: &Identity, transcript: &[ChatMessage]);
}

/// Per-invocation factory producing the memory backend the engine uses.
///
/// A fresh backend is built for every invocation because its durable scope
/// depends on the resolved identity; sharing one across invocations would
/// let concurrent runs cross-write.
pub type BackendFactory = Arc<dyn Fn(&Identity) -> Arc<dyn MemoryBackend> + Send + Sync>;

/// Bindings handed to the engine at construction.
///
/// Explicit instances, passed by reference. Nothing here is discovered
/// through module-level registries.
#[derive(Clone)]
pub struct EngineBindings {
    pub backend_factory: BackendFactory,
    pub step_hooks: Vec<Arc<dyn StepHook>>,
}

impl EngineBindings {
    #[must_use]
    pub fn new(backend_factory: BackendFactory) -> Self {
        Self {
            backend_factory,
            step_hooks: Vec::new(),
        }
    }

    /// Register a step hook.
    #[must_use]
    pub fn with_step_hook(mut self, hook: Arc<dyn StepHook>) -> Self {
        self.step_hooks.push(hook);
        self
    }
}
