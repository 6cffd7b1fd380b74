//! Durable conversation memory on an embedded key-value store.
//!
//! Provides:
//! - `DurableMemoryStore` - Namespaced persistent storage (redb)
//! - Conversation-thread and preference records
//! - `DurableBackend` + the canonical per-invocation backend factory
//! - `TranscriptPersister` - Step hook persisting the running transcript

pub mod backend;
pub mod hook;
pub mod records;
pub mod store;

pub use backend::{DurableBackend, MEMORIES_ROUTE, backend_factory};
pub use hook::TranscriptPersister;
pub use records::{
    ConversationThread, PreferenceRecord, StoreNamespace, UserConversationRecord,
};
pub use store::DurableMemoryStore;
