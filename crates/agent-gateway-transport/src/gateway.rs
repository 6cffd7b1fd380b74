//! Gateway orchestration over the engine and memory seams.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::BoxStream;
use serde_json::Value;

use agent_gateway_core::{
    EngineError, Event, ExecutionEngine, Identity, StreamMode, sanitize,
};
use agent_gateway_engine::{EventNormalizer, normalize_stream};
use agent_gateway_memory::{ConversationThread, DurableMemoryStore};

/// Gateway tuning.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Maximum idle gap between stream chunks before the stream is failed.
    /// `None` disables the guard.
    pub stream_idle_timeout: Option<Duration>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            stream_idle_timeout: Some(Duration::from_secs(120)),
        }
    }
}

/// Orchestrates the outward-facing service over an execution engine and the
/// durable conversation memory.
pub struct Gateway<E> {
    engine: Arc<E>,
    store: Arc<DurableMemoryStore>,
    config: GatewayConfig,
}

impl<E: ExecutionEngine> Gateway<E> {
    #[must_use]
    pub fn new(engine: Arc<E>, store: Arc<DurableMemoryStore>) -> Self {
        Self {
            engine,
            store,
            config: GatewayConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Run a goal to completion and return the sanitized result tree.
    ///
    /// # Errors
    /// Returns the engine's failure; the transport surfaces it as a
    /// structured error response.
    pub async fn run(
        &self,
        goal: &str,
        session_id: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<Value, EngineError> {
        let identity = Identity::resolve(session_id, user_id);
        tracing::debug!(thread_id = %identity.thread_id, "synchronous run");
        let result = self.engine.invoke(goal, &identity).await?;
        Ok(sanitize(&result))
    }

    /// Stream a goal's execution as canonical events.
    ///
    /// Events are delivered in production order with no buffering. An
    /// engine failure mid-stream yields a single error event and then the
    /// stream ends; dropping the returned stream cancels the underlying
    /// engine stream.
    #[must_use]
    pub fn run_stream(
        &self,
        goal: &str,
        mode: StreamMode,
        session_id: Option<&str>,
        user_id: Option<&str>,
    ) -> BoxStream<'static, Event> {
        let identity = Identity::resolve(session_id, user_id);
        tracing::debug!(thread_id = %identity.thread_id, mode = %mode, "streaming run");
        let chunks = self.engine.stream(goal, &mode, true, &identity);
        normalize_stream(
            EventNormalizer::new(mode),
            chunks,
            self.config.stream_idle_timeout,
        )
    }

    /// Conversation threads of a user; a store failure degrades to empty.
    #[must_use]
    pub fn list_threads(&self, user_id: &str) -> Vec<ConversationThread> {
        match self.store.list_threads(user_id) {
            Ok(threads) => threads,
            Err(e) => {
                tracing::error!("failed to list threads for {user_id}: {e}");
                Vec::new()
            }
        }
    }

    /// One conversation thread; absent on store failure.
    #[must_use]
    pub fn get_thread(&self, user_id: &str, thread_id: &str) -> Option<ConversationThread> {
        match self.store.get_thread(user_id, thread_id) {
            Ok(thread) => thread,
            Err(e) => {
                tracing::error!("failed to load thread {thread_id}: {e}");
                None
            }
        }
    }

    /// Delete a conversation thread; false on store failure.
    #[must_use]
    pub fn delete_thread(&self, user_id: &str, thread_id: &str) -> bool {
        match self.store.delete_thread(user_id, thread_id) {
            Ok(deleted) => deleted,
            Err(e) => {
                tracing::error!("failed to delete thread {thread_id}: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::StreamExt;
    use futures::stream;
    use tempfile::TempDir;

    use agent_gateway_core::{ChunkStream, EngineValue, RawChunk};

    /// Engine stand-in that replays a canned chunk script.
    struct ScriptedEngine {
        chunks: Vec<Result<(String, RawChunk), String>>,
        fail_invoke: bool,
    }

    #[async_trait]
    impl ExecutionEngine for ScriptedEngine {
        async fn invoke(
            &self,
            goal: &str,
            identity: &Identity,
        ) -> Result<EngineValue, EngineError> {
            if self.fail_invoke {
                return Err(EngineError::InvokeFailed("no model".into()));
            }
            Ok(EngineValue::Mapping(vec![
                ("goal".into(), EngineValue::from(goal)),
                ("user".into(), EngineValue::from(identity.user_id.clone())),
                (
                    "result".into(),
                    EngineValue::Message {
                        role: Some("ai".into()),
                        content: "done".into(),
                        name: None,
                    },
                ),
            ]))
        }

        fn stream(
            &self,
            _goal: &str,
            _mode: &StreamMode,
            _subgraphs: bool,
            _identity: &Identity,
        ) -> ChunkStream {
            let items: Vec<Result<(String, RawChunk), EngineError>> = self
                .chunks
                .clone()
                .into_iter()
                .map(|item| item.map_err(EngineError::StreamFailed))
                .collect();
            stream::iter(items).boxed()
        }
    }

    fn gateway(engine: ScriptedEngine) -> (Gateway<ScriptedEngine>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store =
            Arc::new(DurableMemoryStore::open(dir.path().join("memories.redb")).unwrap());
        (Gateway::new(Arc::new(engine), store), dir)
    }

    #[tokio::test]
    async fn run_sanitizes_message_objects_in_the_result() {
        let (gateway, _dir) = gateway(ScriptedEngine {
            chunks: Vec::new(),
            fail_invoke: false,
        });
        let result = gateway.run("do it", None, Some("u1")).await.unwrap();
        assert_eq!(result["user"], "u1");
        assert_eq!(
            result["result"],
            serde_json::json!({"type": "ai", "content": "done", "name": null})
        );
    }

    #[tokio::test]
    async fn run_surfaces_engine_failures() {
        let (gateway, _dir) = gateway(ScriptedEngine {
            chunks: Vec::new(),
            fail_invoke: true,
        });
        let err = gateway.run("do it", None, None).await.unwrap_err();
        assert!(matches!(err, EngineError::InvokeFailed(_)));
    }

    #[tokio::test]
    async fn stream_normalizes_suppresses_and_terminates_on_error() {
        let (gateway, _dir) = gateway(ScriptedEngine {
            chunks: vec![
                Ok((
                    String::new(),
                    RawChunk::Sequence(vec![EngineValue::from("hello")]),
                )),
                Ok((
                    String::new(),
                    RawChunk::Sequence(vec![EngineValue::from("")]),
                )),
                Err("model gone".to_string()),
                Ok((
                    String::new(),
                    RawChunk::Sequence(vec![EngineValue::from("never")]),
                )),
            ],
            fail_invoke: false,
        });

        let events: Vec<Event> = gateway
            .run_stream("go", StreamMode::Token, None, None)
            .collect()
            .await;

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], Event::Token { content, .. } if content == "hello"));
        assert!(
            matches!(&events[1], Event::Error { content } if content.contains("model gone"))
        );
    }
}
