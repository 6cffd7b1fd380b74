//! Scripted demonstration engine.
//!
//! Stands in for the external reasoning engine so the server runs end to
//! end: it walks a canned think/execute/answer loop, reads and writes
//! memory through the per-invocation backend, reports the transcript to the
//! step hooks, and emits chunks in whichever mode the caller asked for.

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use agent_gateway_core::{
    ChatMessage, ChunkStream, EngineBindings, EngineError, EngineValue, ExecutionEngine, Identity,
    RawChunk, StreamMode,
};

/// An explicit tool catalog instance, passed in at construction.
///
/// The real catalog lives outside the gateway; this one just names what the
/// scripted engine pretends to call.
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    tools: Vec<String>,
}

impl ToolCatalog {
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            tools: vec!["calculator".to_string(), "web_search".to_string()],
        }
    }

    #[must_use]
    pub fn first(&self) -> &str {
        self.tools.first().map_or("noop", String::as_str)
    }
}

/// Demonstration engine replaying a fixed reasoning script.
pub struct ScriptedEngine {
    catalog: ToolCatalog,
    bindings: EngineBindings,
}

impl ScriptedEngine {
    #[must_use]
    pub fn new(catalog: ToolCatalog, bindings: EngineBindings) -> Self {
        Self { catalog, bindings }
    }

    /// One scripted reasoning pass: transcript steps, memory traffic, and
    /// the chunks each step would emit.
    async fn drive(
        &self,
        goal: String,
        mode: StreamMode,
        subgraphs: bool,
        identity: Identity,
        tx: mpsc::Sender<Result<(String, RawChunk), EngineError>>,
    ) {
        let backend = (self.bindings.backend_factory)(&identity);
        let tool = self.catalog.first().to_string();

        // scratch state lives only for this invocation
        if let Err(e) = backend
            .write("/scratch/plan", serde_json::json!(["think", "execute"]))
            .await
        {
            tracing::warn!("scratch write failed: {e}");
        }

        let mut transcript = vec![ChatMessage::human(goal.clone())];
        self.report_step(&identity, &transcript).await;

        let plan = format!("I will answer \"{goal}\" using {tool}.");
        transcript.push(ChatMessage::ai(plan.clone()));
        self.report_step(&identity, &transcript).await;

        let answer = format!("Completed: {goal}");
        transcript.push(ChatMessage::tool("ok", tool));
        transcript.push(ChatMessage::ai(answer.clone()));
        self.report_step(&identity, &transcript).await;

        // the routed write survives this invocation
        if let Err(e) = backend
            .write("/memories/last_goal", serde_json::json!(goal))
            .await
        {
            tracing::warn!("memory write failed: {e}");
        }

        for (namespace, chunk) in script_chunks(&mode, subgraphs, &plan, &answer) {
            if tx.send(Ok((namespace, chunk))).await.is_err() {
                // consumer went away; stop producing
                tracing::debug!("stream consumer dropped, aborting script");
                return;
            }
        }
    }

    async fn report_step(&self, identity: &Identity, transcript: &[ChatMessage]) {
        for hook in &self.bindings.step_hooks {
            hook.after_step(identity, transcript).await;
        }
    }
}

fn script_chunks(
    mode: &StreamMode,
    subgraphs: bool,
    plan: &str,
    answer: &str,
) -> Vec<(String, RawChunk)> {
    let mut chunks = Vec::new();
    match mode {
        StreamMode::Token => {
            for word in plan.split_inclusive(' ') {
                chunks.push((
                    String::new(),
                    RawChunk::pair(
                        EngineValue::Message {
                            role: Some("ai".to_string()),
                            content: word.to_string(),
                            name: None,
                        },
                        EngineValue::from(serde_json::json!({"model": "scripted"})),
                    ),
                ));
            }
            // an empty token the normalizer is expected to suppress
            chunks.push((
                String::new(),
                RawChunk::pair(EngineValue::from(""), EngineValue::empty_mapping()),
            ));
            if subgraphs {
                chunks.push((
                    "researcher".to_string(),
                    RawChunk::Sequence(vec![EngineValue::from(answer)]),
                ));
            }
        }
        StreamMode::Update => {
            chunks.push((
                String::new(),
                RawChunk::Value(EngineValue::from(
                    serde_json::json!({"node": "plan", "output": plan}),
                )),
            ));
            if subgraphs {
                chunks.push((
                    "researcher".to_string(),
                    RawChunk::Value(EngineValue::from(
                        serde_json::json!({"node": "research", "output": answer}),
                    )),
                ));
            }
            chunks.push((
                String::new(),
                RawChunk::Value(EngineValue::from(
                    serde_json::json!({"node": "answer", "output": answer}),
                )),
            ));
        }
        StreamMode::Custom | StreamMode::Other(_) => {
            chunks.push((
                String::new(),
                RawChunk::Value(EngineValue::from(
                    serde_json::json!({"progress": 1.0, "detail": answer}),
                )),
            ));
        }
    }
    chunks
}

#[async_trait]
impl ExecutionEngine for ScriptedEngine {
    async fn invoke(&self, goal: &str, identity: &Identity) -> Result<EngineValue, EngineError> {
        // same script as streaming, with the chunks discarded
        let (tx, _rx) = mpsc::channel(16);
        self.drive(
            goal.to_string(),
            StreamMode::Update,
            false,
            identity.clone(),
            tx,
        )
        .await;

        Ok(EngineValue::Mapping(vec![
            ("completed".to_string(), EngineValue::Bool(true)),
            (
                "result".to_string(),
                EngineValue::Message {
                    role: Some("ai".to_string()),
                    content: format!("Completed: {goal}"),
                    name: None,
                },
            ),
        ]))
    }

    fn stream(
        &self,
        goal: &str,
        mode: &StreamMode,
        subgraphs: bool,
        identity: &Identity,
    ) -> ChunkStream {
        let (tx, rx) = mpsc::channel(16);
        let engine = Self {
            catalog: self.catalog.clone(),
            bindings: self.bindings.clone(),
        };
        let goal = goal.to_string();
        let mode = mode.clone();
        let identity = identity.clone();
        tokio::spawn(async move {
            engine.drive(goal, mode, subgraphs, identity, tx).await;
        });
        ReceiverStream::new(rx).boxed()
    }
}
