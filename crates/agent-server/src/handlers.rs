//! HTTP Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use agent_core::{
    AgentError, AgentEvent, Message, QueryStatus, SessionId, ToolSchema, provider::ModelInfo,
};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub provider_connected: bool,
    pub sessions: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: String,
    pub message_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub session_id: String,
    pub outcome: QueryStatus,
    pub requests: usize,
    pub message_count: usize,
    pub events: Vec<AgentEvent>,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub session_id: String,
    pub title: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>, code: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

fn agent_error(err: &AgentError) -> ApiError {
    let status = match err {
        AgentError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        AgentError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        AgentError::Provider(_)
        | AgentError::ProviderUnavailable(_)
        | AgentError::Auth(_)
        | AgentError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, err.user_message(), err.code())
}

fn session_not_found(id: &str) -> ApiError {
    agent_error(&AgentError::SessionNotFound(id.to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider = state.agent.provider();
    let provider_connected = provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: provider.info().name,
        provider_connected,
        sessions: state.sessions.len(),
    })
}

/// Models the provider reports
pub async fn list_models(
    State(state): State<AppState>,
) -> Result<Json<Vec<ModelInfo>>, ApiError> {
    state
        .agent
        .provider()
        .list_models()
        .await
        .map(Json)
        .map_err(|e| {
            tracing::warn!("Failed to list models: {}", e);
            agent_error(&e)
        })
}

/// Tools the model may call
pub async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolSchema>> {
    Json(state.agent.tools().schemas())
}

/// Start a session seeded with the instruction block
pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionCreated>) {
    let session = state.agent.new_session();
    let message_count = session.message_count();
    let id = state.sessions.insert(session);

    tracing::info!(session = %id, "Session created");

    (
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id: id.to_string(),
            message_count,
        }),
    )
}

/// Run one user query through the agent loop
pub async fn run_query(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    if payload.query.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Query must not be empty", "EMPTY_QUERY"));
    }

    let shared = state
        .sessions
        .get(&SessionId::from_string(&id))
        .ok_or_else(|| session_not_found(&id))?;

    // Held for the whole loop: one query at a time per session.
    let mut session = shared.lock().await;
    let mut events = Vec::new();

    let outcome = state
        .agent
        .run(&mut session, &payload.query, &mut events)
        .await
        .map_err(|e| {
            tracing::error!(session = %id, "Agent error: {}", e);
            agent_error(&e)
        })?;

    Ok(Json(QueryResponse {
        session_id: id,
        outcome: outcome.status,
        requests: outcome.requests,
        message_count: session.message_count(),
        events,
    }))
}

/// Full conversation of a session
pub async fn get_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let shared = state
        .sessions
        .get(&SessionId::from_string(&id))
        .ok_or_else(|| session_not_found(&id))?;
    let session = shared.lock().await;

    Ok(Json(TranscriptResponse {
        session_id: id,
        title: session.title(),
        messages: session.conversation().messages().to_vec(),
    }))
}

/// Forget a session
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(&SessionId::from_string(&id)) {
        tracing::info!(session = %id, "Session deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(&id))
    }
}
