//! Per-invocation scratch memory.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use agent_gateway_core::{MemoryBackend, StoreError};

/// Non-persistent memory scoped to a single invocation.
///
/// Dropped with the invocation; nothing written here survives it.
#[derive(Debug, Default)]
pub struct EphemeralStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl EphemeralStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryBackend for EphemeralStore {
    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .entries
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?
            .get(path)
            .cloned())
    }

    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.entries
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?
            .insert(path.to_string(), value);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<bool, StoreError> {
        Ok(self
            .entries
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?
            .remove(path)
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_read_delete_cycle() {
        let store = EphemeralStore::new();
        assert_eq!(store.read("/scratch/x").await.unwrap(), None);

        store
            .write("/scratch/x", serde_json::json!({"todo": []}))
            .await
            .unwrap();
        assert!(store.read("/scratch/x").await.unwrap().is_some());

        assert!(store.delete("/scratch/x").await.unwrap());
        assert!(!store.delete("/scratch/x").await.unwrap());
    }
}
