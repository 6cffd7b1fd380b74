//! Prefix-routed dispatch between ephemeral and persistent memory.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use agent_gateway_core::{MemoryBackend, StoreError};

/// Routes memory accesses by path prefix.
///
/// Registered prefixes dispatch to their handle, longest prefix first;
/// everything else falls back to the default handle. A router is built per
/// invocation by a `BackendFactory` because the persistent handle's
/// namespace depends on the current identity.
pub struct BackendRouter {
    default: Arc<dyn MemoryBackend>,
    routes: Vec<(String, Arc<dyn MemoryBackend>)>,
}

impl BackendRouter {
    #[must_use]
    pub fn new(default: Arc<dyn MemoryBackend>) -> Self {
        Self {
            default,
            routes: Vec::new(),
        }
    }

    /// Register a handle for a path prefix.
    #[must_use]
    pub fn route_prefix(
        mut self,
        prefix: impl Into<String>,
        handle: Arc<dyn MemoryBackend>,
    ) -> Self {
        self.routes.push((prefix.into(), handle));
        // longest prefix first so the most specific route wins
        self.routes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        self
    }

    /// Resolve the handle for a path.
    #[must_use]
    pub fn route(&self, path: &str) -> &Arc<dyn MemoryBackend> {
        self.routes
            .iter()
            .find(|(prefix, _)| path.starts_with(prefix.as_str()))
            .map_or(&self.default, |(_, handle)| handle)
    }
}

#[async_trait]
impl MemoryBackend for BackendRouter {
    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError> {
        self.route(path).read(path).await
    }

    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.route(path).write(path, value).await
    }

    async fn delete(&self, path: &str) -> Result<bool, StoreError> {
        self.route(path).delete(path).await
    }
}
