//! Demonstration gateway server.
//!
//! Run with: cargo run -p gateway-server-demo
//!
//! Streams a scripted agent over SSE:
//! curl -N 'http://localhost:8000/run-agent-stream?goal=hello&stream_mode=messages'

mod config;
mod engine;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_gateway_core::EngineBindings;
use agent_gateway_memory::{DurableMemoryStore, TranscriptPersister, backend_factory};
use agent_gateway_transport::{Gateway, http::create_router};

use crate::config::Config;
use crate::engine::{ScriptedEngine, ToolCatalog};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    if let Some(parent) = config.store_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = Arc::new(DurableMemoryStore::open(&config.store_path)?);
    store.initialize_preferences()?;
    tracing::info!("opened memory store at {}", config.store_path.display());

    // explicit instances, constructed once and passed by reference
    let catalog = ToolCatalog::builtin();
    let bindings = EngineBindings::new(backend_factory(Arc::clone(&store)))
        .with_step_hook(Arc::new(TranscriptPersister::new(Arc::clone(&store))));
    tracing::info!(
        model_provider = %config.model_provider,
        search_provider = %config.search_provider,
        "constructing engine"
    );
    let gateway = Arc::new(Gateway::new(
        Arc::new(ScriptedEngine::new(catalog, bindings)),
        Arc::clone(&store),
    ));

    let app = create_router(gateway).layer(CorsLayer::permissive());

    let addr = SocketAddr::from((config.host, config.port));
    tracing::info!("Gateway listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
