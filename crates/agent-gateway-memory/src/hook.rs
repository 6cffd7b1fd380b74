//! Transcript persistence after each reasoning step.

use std::sync::Arc;

use async_trait::async_trait;

use agent_gateway_core::{ChatMessage, Identity, StepHook};

use crate::store::DurableMemoryStore;

/// Persists the running transcript as the identity's conversation thread.
///
/// A store failure here is logged and swallowed: a memory write must never
/// take down the reasoning loop that triggered it.
pub struct TranscriptPersister {
    store: Arc<DurableMemoryStore>,
}

impl TranscriptPersister {
    #[must_use]
    pub fn new(store: Arc<DurableMemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StepHook for TranscriptPersister {
    async fn after_step(&self, identity: &Identity, transcript: &[ChatMessage]) {
        if transcript.is_empty() {
            return;
        }
        if let Err(e) =
            self.store
                .upsert_thread(&identity.user_id, &identity.thread_id, transcript.to_vec())
        {
            tracing::error!(
                thread_id = %identity.thread_id,
                "failed to persist transcript: {e}"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn each_step_replaces_the_thread_transcript() {
        let dir = TempDir::new().unwrap();
        let store =
            Arc::new(DurableMemoryStore::open(dir.path().join("memories.redb")).unwrap());
        let hook = TranscriptPersister::new(Arc::clone(&store));
        let identity = Identity::resolve(Some("t1"), Some("u1"));

        hook.after_step(&identity, &[ChatMessage::human("goal")]).await;
        hook.after_step(
            &identity,
            &[ChatMessage::human("goal"), ChatMessage::ai("answer")],
        )
        .await;

        let thread = store.get_thread("u1", "t1").unwrap().unwrap();
        assert_eq!(thread.messages.len(), 2);
        assert_eq!(store.list_threads("u1").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_transcripts_are_not_persisted() {
        let dir = TempDir::new().unwrap();
        let store =
            Arc::new(DurableMemoryStore::open(dir.path().join("memories.redb")).unwrap());
        let hook = TranscriptPersister::new(Arc::clone(&store));
        let identity = Identity::resolve(Some("t1"), Some("u1"));

        hook.after_step(&identity, &[]).await;
        assert!(store.list_threads("u1").unwrap().is_empty());
    }
}
