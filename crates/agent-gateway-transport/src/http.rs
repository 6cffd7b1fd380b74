//! HTTP surface: synchronous runs, SSE streaming, conversation history.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event as SseEvent, Sse},
    },
    routing::{get, post},
};
use futures::{Stream, StreamExt, stream};
use serde::Deserialize;
use serde_json::{Value, json};

use agent_gateway_core::{ExecutionEngine, StreamMode};

use crate::gateway::Gateway;
use crate::protocol::{AgentReply, AgentRequest, DONE_SENTINEL, event_json};

/// Query parameters of the streaming route.
#[derive(Debug, Deserialize)]
pub struct StreamParams {
    pub goal: String,
    #[serde(default = "default_stream_mode")]
    pub stream_mode: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

fn default_stream_mode() -> String {
    "updates".to_string()
}

/// Build the gateway router.
#[must_use]
pub fn create_router<E>(gateway: Arc<Gateway<E>>) -> Router
where
    E: ExecutionEngine + 'static,
{
    Router::new()
        .route("/", get(service_info))
        .route("/run-agent", post(run_agent::<E>))
        .route("/run-agent-stream", get(run_agent_stream::<E>))
        .route("/conversations/{user_id}", get(list_conversations::<E>))
        .route(
            "/conversations/{user_id}/{thread_id}",
            get(get_conversation::<E>).delete(delete_conversation::<E>),
        )
        .with_state(gateway)
}

async fn service_info() -> Json<Value> {
    Json(json!({
        "message": "agent gateway",
        "endpoints": {
            "/run-agent": "run a goal (synchronous)",
            "/run-agent-stream": "run a goal (SSE stream)",
            "/conversations/{user_id}": "list conversation threads",
            "/conversations/{user_id}/{thread_id}": "get or delete one thread",
        },
    }))
}

async fn run_agent<E: ExecutionEngine>(
    State(gateway): State<Arc<Gateway<E>>>,
    Json(request): Json<AgentRequest>,
) -> (StatusCode, Json<AgentReply>) {
    match gateway
        .run(
            &request.goal,
            request.session_id.as_deref(),
            request.user_id.as_deref(),
        )
        .await
    {
        Ok(data) => (StatusCode::OK, Json(AgentReply::ok(data))),
        Err(e) => {
            tracing::error!("synchronous run failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AgentReply::err(e.to_string())),
            )
        }
    }
}

async fn run_agent_stream<E: ExecutionEngine>(
    State(gateway): State<Arc<Gateway<E>>>,
    Query(params): Query<StreamParams>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let mode = StreamMode::parse(&params.stream_mode);
    let events = gateway
        .run_stream(
            &params.goal,
            mode,
            params.session_id.as_deref(),
            params.user_id.as_deref(),
        )
        .map(|event| SseEvent::default().data(event_json(&event)))
        .chain(stream::once(async {
            SseEvent::default().data(DONE_SENTINEL)
        }))
        .map(Ok);
    Sse::new(events)
}

async fn list_conversations<E: ExecutionEngine>(
    State(gateway): State<Arc<Gateway<E>>>,
    Path(user_id): Path<String>,
) -> Response {
    Json(gateway.list_threads(&user_id)).into_response()
}

async fn get_conversation<E: ExecutionEngine>(
    State(gateway): State<Arc<Gateway<E>>>,
    Path((user_id, thread_id)): Path<(String, String)>,
) -> Response {
    match gateway.get_thread(&user_id, &thread_id) {
        Some(thread) => Json(thread).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "thread not found"})),
        )
            .into_response(),
    }
}

async fn delete_conversation<E: ExecutionEngine>(
    State(gateway): State<Arc<Gateway<E>>>,
    Path((user_id, thread_id)): Path<(String, String)>,
) -> Json<Value> {
    let deleted = gateway.delete_thread(&user_id, &thread_id);
    Json(json!({"deleted": deleted}))
}
