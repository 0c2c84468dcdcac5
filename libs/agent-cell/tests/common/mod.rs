#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use agent_cell::{
    clinic_tool_registry, AgentOrchestrator, ModelClient, ModelError, ModelRequest, ModelTurn,
    OrchestratorConfig, SessionStore, ToolHandler, ToolRequest,
};
use analytics_cell::ReportService;
use appointment_cell::BookingService;
use doctor_cell::AvailabilityService;
use notification_cell::{
    NotificationChannel, NotificationDispatcher, NotificationError, NotificationEvent, Notifier,
};
use shared_config::DEFAULT_TIMEZONE;
use shared_database::{ClinicStore, InMemoryClinicStore};
use shared_utils::test_utils::fixed_clock;

// ==============================================================================
// FAKE MODEL
// ==============================================================================

type Responder = Box<dyn Fn(&ModelRequest) -> Result<ModelTurn, ModelError> + Send + Sync>;

/// A model boundary answering from a closure, recording every request.
pub struct FakeModel {
    responder: Responder,
    requests: Mutex<Vec<ModelRequest>>,
    calls: AtomicUsize,
}

impl FakeModel {
    pub fn new(
        responder: impl Fn(&ModelRequest) -> Result<ModelTurn, ModelError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    /// Replays `script` in order, then answers "done".
    pub fn scripted(script: Vec<Result<ModelTurn, ModelError>>) -> Arc<Self> {
        let queue = Mutex::new(VecDeque::from(script));
        Self::new(move |_| {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ModelTurn::text("done")))
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for FakeModel {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelTurn, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        (self.responder)(request)
    }
}

/// Never answers within any reasonable deadline.
pub struct StalledModel;

#[async_trait]
impl ModelClient for StalledModel {
    async fn complete(&self, _request: &ModelRequest) -> Result<ModelTurn, ModelError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(ModelTurn::text("too late"))
    }
}

pub fn call(id: &str, name: &str, arguments: Value) -> ToolRequest {
    ToolRequest {
        id: id.to_string(),
        name: name.to_string(),
        arguments,
    }
}

// ==============================================================================
// FAKE NOTIFIER
// ==============================================================================

pub struct RecordingNotifier {
    channel: NotificationChannel,
    fail: bool,
    events: Mutex<Vec<NotificationEvent>>,
}

impl RecordingNotifier {
    pub fn new(channel: NotificationChannel) -> Arc<Self> {
        Arc::new(Self {
            channel,
            fail: false,
            events: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(channel: NotificationChannel) -> Arc<Self> {
        Arc::new(Self {
            channel,
            fail: true,
            events: Mutex::new(Vec::new()),
        })
    }

    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn channel(&self) -> NotificationChannel {
        self.channel
    }

    fn accepts(&self, event: &NotificationEvent) -> bool {
        match event {
            NotificationEvent::AppointmentBooked { .. } => self.channel != NotificationChannel::Slack,
            NotificationEvent::SummaryReport { .. } => self.channel == NotificationChannel::Slack,
        }
    }

    async fn notify(&self, event: &NotificationEvent) -> Result<(), NotificationError> {
        self.events.lock().unwrap().push(event.clone());
        if self.fail {
            return Err(NotificationError::Rejected {
                channel: self.channel,
                message: "channel_not_found".to_string(),
            });
        }
        Ok(())
    }
}

// ==============================================================================
// HARNESS
// ==============================================================================

pub struct Harness {
    pub orchestrator: Arc<AgentOrchestrator>,
    pub store: Arc<InMemoryClinicStore>,
}

/// Default roster, clock frozen at Monday 2026-02-16 08:00.
pub fn harness(model: Arc<dyn ModelClient>, config: OrchestratorConfig) -> Harness {
    harness_with_notifications(model, config, NotificationDispatcher::disabled())
}

pub fn harness_with_notifications(
    model: Arc<dyn ModelClient>,
    config: OrchestratorConfig,
    notifications: NotificationDispatcher,
) -> Harness {
    build_harness(model, config, notifications, Vec::new())
}

/// Clinic tools plus `extra` handlers.
pub fn harness_with_tools(
    model: Arc<dyn ModelClient>,
    config: OrchestratorConfig,
    extra: Vec<Arc<dyn ToolHandler>>,
) -> Harness {
    build_harness(model, config, NotificationDispatcher::disabled(), extra)
}

fn build_harness(
    model: Arc<dyn ModelClient>,
    config: OrchestratorConfig,
    notifications: NotificationDispatcher,
    extra: Vec<Arc<dyn ToolHandler>>,
) -> Harness {
    let store = Arc::new(InMemoryClinicStore::with_default_roster());
    let clinic_store: Arc<dyn ClinicStore> = store.clone();
    let clock = fixed_clock("2026-02-16T08:00");

    let mut registry = clinic_tool_registry(
        Arc::new(AvailabilityService::new(Arc::clone(&clinic_store))),
        Arc::new(BookingService::new(Arc::clone(&clinic_store), DEFAULT_TIMEZONE)),
        Arc::new(ReportService::new(Arc::clone(&clinic_store), clock.clone())),
        Arc::new(notifications),
    );
    for handler in extra {
        registry.register(handler);
    }

    let orchestrator = AgentOrchestrator::new(
        model,
        Arc::new(registry),
        Arc::new(SessionStore::new()),
        clinic_store,
        clock,
        config,
    );

    Harness {
        orchestrator: Arc::new(orchestrator),
        store,
    }
}

pub fn config(max_iterations: usize) -> OrchestratorConfig {
    OrchestratorConfig {
        max_iterations,
        ..OrchestratorConfig::default()
    }
}
