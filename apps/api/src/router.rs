use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use agent_cell::{
    agent_routes, clinic_tool_registry, AgentOrchestrator, OpenAiChatClient, OrchestratorConfig,
    SessionStore,
};
use analytics_cell::{report_routes, ReportService};
use appointment_cell::{appointment_routes, BookingService};
use doctor_cell::{doctor_routes, AvailabilityService};
use notification_cell::NotificationDispatcher;
use shared_config::AppConfig;
use shared_database::ClinicStore;
use shared_utils::Clock;

/// Every service the HTTP surface routes to.
pub struct AppServices {
    pub availability: Arc<AvailabilityService>,
    pub booking: Arc<BookingService>,
    pub reports: Arc<ReportService>,
    pub orchestrator: Arc<AgentOrchestrator>,
}

impl AppServices {
    pub fn build(
        config: &AppConfig,
        store: Arc<dyn ClinicStore>,
        clock: Arc<dyn Clock>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        let availability = Arc::new(AvailabilityService::new(Arc::clone(&store)));
        let booking = Arc::new(BookingService::new(Arc::clone(&store), config.clinic_timezone));
        let reports = Arc::new(ReportService::new(Arc::clone(&store), Arc::clone(&clock)));
        let notifications = Arc::new(NotificationDispatcher::from_config(config));

        let tools = clinic_tool_registry(
            Arc::clone(&availability),
            Arc::clone(&booking),
            Arc::clone(&reports),
            notifications,
        );

        let orchestrator = Arc::new(AgentOrchestrator::new(
            Arc::new(OpenAiChatClient::new(config)),
            Arc::new(tools),
            sessions,
            store,
            clock,
            OrchestratorConfig::from_app_config(config),
        ));

        Self {
            availability,
            booking,
            reports,
            orchestrator,
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "message": "Clinic appointment agent is running"
    }))
}

pub fn create_router(services: AppServices) -> Router {
    let api = agent_routes(services.orchestrator)
        .nest("/doctors", doctor_routes(services.availability))
        .nest("/appointments", appointment_routes(services.booking))
        .nest("/reports", report_routes(services.reports));

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .nest("/api", api)
}
