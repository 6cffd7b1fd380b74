//! Core abstractions for the agent gateway.
//!
//! This crate provides the fundamental building blocks:
//! - `Identity` - Conversation identity resolution
//! - `Event` - Canonical normalized event envelope
//! - `EngineValue` / `sanitize` - Transport-safe value conversion
//! - `ChatMessage` - Normalized transcript entries
//! - Engine, memory-backend and step-hook traits

pub mod chunk;
pub mod context;
pub mod event;
pub mod message;
pub mod traits;
pub mod value;

pub use chunk::{RawChunk, StreamMode};
pub use context::Identity;
pub use event::{Event, EventSource};
pub use message::{ChatMessage, MessageKind};
pub use traits::{
    BackendFactory, ChunkStream, EngineBindings, EngineError, ExecutionEngine, MemoryBackend,
    StepHook, StoreError,
};
pub use value::{EngineValue, sanitize};
