//! Engine-facing adapters for the agent gateway.
//!
//! Provides:
//! - `EventNormalizer` - Raw chunk streams to canonical events
//! - `BackendRouter` - Prefix-routed two-tier memory dispatch
//! - `EphemeralStore` - Per-invocation scratch memory

pub mod ephemeral;
pub mod normalizer;
pub mod router;

pub use ephemeral::EphemeralStore;
pub use normalizer::{EventNormalizer, normalize_stream};
pub use router::BackendRouter;
