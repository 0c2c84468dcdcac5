// libs/agent-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_models::error::AppError;

use crate::models::{ChatRequest, ChatResponse};
use crate::services::orchestrator::AgentOrchestrator;

#[axum::debug_handler]
pub async fn chat(
    State(orchestrator): State<Arc<AgentOrchestrator>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(AppError::BadRequest("Message cannot be empty".to_string()));
    }
    let session_id = request.session_id.trim();
    if session_id.is_empty() {
        return Err(AppError::BadRequest("Session id cannot be empty".to_string()));
    }

    let outcome = orchestrator.chat(session_id, message).await;
    debug!("Session {} turn finished with {:?}", session_id, outcome.status);

    Ok(Json(ChatResponse {
        response: outcome.response,
        session_id: session_id.to_string(),
        appointment_id: outcome.appointment_id,
    }))
}

#[axum::debug_handler]
pub async fn clear_session(
    State(orchestrator): State<Arc<AgentOrchestrator>>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    orchestrator.clear_session(&session_id);

    Ok(Json(json!({
        "message": "Session cleared successfully"
    })))
}
