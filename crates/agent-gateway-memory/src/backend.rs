//! Persistent router handle scoped to one identity.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use agent_gateway_core::{BackendFactory, Identity, MemoryBackend, StoreError};
use agent_gateway_engine::{BackendRouter, EphemeralStore};

use crate::records::StoreNamespace;
use crate::store::DurableMemoryStore;

/// Path prefix routed to persistent memory.
pub const MEMORIES_ROUTE: &str = "/memories/";

/// `MemoryBackend` over the durable store, fixed to one namespace.
///
/// Built per invocation: the namespace embeds the resolved identity, so
/// concurrent invocations write disjoint partitions.
pub struct DurableBackend {
    store: Arc<DurableMemoryStore>,
    namespace: StoreNamespace,
}

impl DurableBackend {
    #[must_use]
    pub fn new(store: Arc<DurableMemoryStore>, namespace: StoreNamespace) -> Self {
        Self { store, namespace }
    }

    /// Canonical persistent scope for an identity: `("memories", user_id)`.
    #[must_use]
    pub fn for_identity(store: Arc<DurableMemoryStore>, identity: &Identity) -> Self {
        let namespace = StoreNamespace::new(["memories", identity.user_id.as_str()]);
        Self::new(store, namespace)
    }

    fn key(path: &str) -> &str {
        path.trim_start_matches('/')
    }
}

#[async_trait]
impl MemoryBackend for DurableBackend {
    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError> {
        self.store.get(&self.namespace, Self::key(path))
    }

    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.store.put(&self.namespace, Self::key(path), &value)
    }

    async fn delete(&self, path: &str) -> Result<bool, StoreError> {
        self.store.remove(&self.namespace, Self::key(path))
    }
}

/// Canonical per-invocation backend factory: an ephemeral default with
/// `/memories/` routed to the identity-scoped durable backend.
#[must_use]
pub fn backend_factory(store: Arc<DurableMemoryStore>) -> BackendFactory {
    Arc::new(move |identity: &Identity| -> Arc<dyn MemoryBackend> {
        let durable = Arc::new(DurableBackend::for_identity(Arc::clone(&store), identity));
        Arc::new(
            BackendRouter::new(Arc::new(EphemeralStore::new()))
                .route_prefix(MEMORIES_ROUTE, durable as Arc<dyn MemoryBackend>),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store() -> (Arc<DurableMemoryStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = DurableMemoryStore::open(dir.path().join("memories.redb")).unwrap();
        (Arc::new(store), dir)
    }

    #[tokio::test]
    async fn factory_scopes_namespaces_per_identity() {
        let (store, _dir) = open_store();
        let factory = backend_factory(Arc::clone(&store));

        let alice = factory(&Identity::resolve(Some("t1"), Some("alice")));
        let bob = factory(&Identity::resolve(Some("t2"), Some("bob")));

        alice
            .write("/memories/note", serde_json::json!("alice's"))
            .await
            .unwrap();
        assert_eq!(bob.read("/memories/note").await.unwrap(), None);
        assert_eq!(
            alice.read("/memories/note").await.unwrap(),
            Some(serde_json::json!("alice's"))
        );
    }

    #[tokio::test]
    async fn memories_route_persists_and_scratch_does_not() {
        let (store, _dir) = open_store();
        let factory = backend_factory(Arc::clone(&store));
        let identity = Identity::resolve(Some("t1"), Some("u1"));

        {
            let backend = factory(&identity);
            backend
                .write("/memories/goal", serde_json::json!("persisted"))
                .await
                .unwrap();
            backend
                .write("/scratch/tmp", serde_json::json!("volatile"))
                .await
                .unwrap();
        }

        // a later invocation of the same identity sees only the routed write
        let backend = factory(&identity);
        assert_eq!(
            backend.read("/memories/goal").await.unwrap(),
            Some(serde_json::json!("persisted"))
        );
        assert_eq!(backend.read("/scratch/tmp").await.unwrap(), None);
    }
}
