//! Web App Builder server
//!
//! Axum server exposing the step-protocol agent over a small session API,
//! plus a static single-page UI that renders notices, generated files and a
//! sandboxed inline preview.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{AgentBuilder, AgentConfig, LlmProvider};
use agent_runtime::OpenAiProvider;
use webapp_builder::{ToolsConfig, WEBAPP_BUILDER_PROMPT, builtin_registry};

use crate::handlers::{
    create_session, delete_session, get_messages, health_check, list_models, list_tools,
    run_query,
};
use crate::state::{AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let server = ServerConfig::from_env();

    // Initialize LLM provider
    let provider = OpenAiProvider::from_env()?;
    if provider.config().api_key.is_none() {
        tracing::warn!("⚠ OPENAI_API_KEY is not set - hosted completions will be rejected");
    }
    let provider: Arc<dyn LlmProvider> = Arc::new(provider);

    match provider.health_check().await {
        Ok(true) => tracing::info!("✓ Connected to {}", provider.info().endpoint),
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ {} not reachable - queries will fail", provider.info().endpoint);
        }
    }

    // Initialize tools
    let tools = builtin_registry(&ToolsConfig::from_env());
    tracing::info!("Registered {} tools:", tools.len());
    for name in tools.names() {
        tracing::info!("  • {}", name);
    }

    let agent = AgentBuilder::new()
        .provider(provider)
        .tools(tools)
        .config(AgentConfig::from_env())
        .system_prompt(WEBAPP_BUILDER_PROMPT)
        .build()?;
    tracing::info!(model = %agent.config().generation.model, "Agent ready");

    let app = router(AppState::new(agent), &server);

    let listener = tokio::net::TcpListener::bind(&server.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 web app builder running on http://{}", server.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET    /health                    - Health check");
    tracing::info!("  GET    /api/models                - List available models");
    tracing::info!("  GET    /api/tools                 - List tools");
    tracing::info!("  POST   /api/sessions              - Start a session");
    tracing::info!("  POST   /api/sessions/{{id}}/query   - Send a query");
    tracing::info!("  GET    /api/sessions/{{id}}/messages - Conversation transcript");
    tracing::info!("  DELETE /api/sessions/{{id}}         - End a session");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState, server: &ServerConfig) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/health", get(health_check))
        .route("/api/models", get(list_models))
        .route("/api/tools", get(list_tools))
        // Sessions
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", axum::routing::delete(delete_session))
        .route("/api/sessions/{id}/query", post(run_query))
        .route("/api/sessions/{id}/messages", get(get_messages))
        // Static UI
        .fallback_service(ServeDir::new(&server.static_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
