// libs/agent-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{delete, post},
    Router,
};

use crate::handlers;
use crate::services::orchestrator::AgentOrchestrator;

pub fn agent_routes(orchestrator: Arc<AgentOrchestrator>) -> Router {
    Router::new()
        .route("/chat", post(handlers::chat))
        .route("/session/{session_id}", delete(handlers::clear_session))
        .with_state(orchestrator)
}
