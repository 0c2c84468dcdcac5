pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

pub use models::*;
pub use services::{
    clinic_tools::clinic_tool_registry,
    model::{parse_completion, ModelClient, ModelError, ModelRequest, ModelTurn, OpenAiChatClient},
    orchestrator::{AgentOrchestrator, OrchestratorConfig, DEFAULT_FALLBACK_MESSAGE},
    prompt::build_system_prompt,
    session::{Session, SessionStore},
    tools::{ToolDefinition, ToolError, ToolHandler, ToolRegistry},
};
pub use router::agent_routes;
