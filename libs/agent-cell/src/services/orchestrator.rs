// libs/agent-cell/src/services/orchestrator.rs
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, warn};

use doctor_cell::DoctorService;
use shared_config::AppConfig;
use shared_database::ClinicStore;
use shared_utils::Clock;

use crate::models::{ChatOutcome, ToolErrorKind, ToolOutcome, ToolRequest, Turn, TurnStatus};
use crate::services::clinic_tools::BOOK_APPOINTMENT;
use crate::services::model::{ModelClient, ModelError, ModelRequest, ModelTurn};
use crate::services::prompt::build_system_prompt;
use crate::services::session::{Session, SessionStore};
use crate::services::tools::ToolRegistry;

pub const DEFAULT_FALLBACK_MESSAGE: &str =
    "I apologize, but I reached the maximum number of tool calls.";

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Model round trips allowed per user turn.
    pub max_iterations: usize,
    /// Deadline for the whole turn, all iterations included.
    pub turn_timeout: Duration,
    pub fallback_message: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            turn_timeout: Duration::from_secs(60),
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }
}

impl OrchestratorConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_iterations: config.agent_max_iterations.max(1),
            turn_timeout: config.agent_turn_timeout,
            ..Self::default()
        }
    }
}

/// Drives the bounded model/tool loop for chat turns.
pub struct AgentOrchestrator {
    model: Arc<dyn ModelClient>,
    tools: Arc<ToolRegistry>,
    sessions: Arc<SessionStore>,
    doctors: DoctorService,
    clock: Arc<dyn Clock>,
    config: OrchestratorConfig,
}

impl AgentOrchestrator {
    pub fn new(
        model: Arc<dyn ModelClient>,
        tools: Arc<ToolRegistry>,
        sessions: Arc<SessionStore>,
        store: Arc<dyn ClinicStore>,
        clock: Arc<dyn Clock>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            model,
            tools,
            sessions,
            doctors: DoctorService::new(store),
            clock,
            config,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn clear_session(&self, session_id: &str) -> bool {
        self.sessions.clear(session_id)
    }

    /// Run one user turn to completion. Never fails: model errors, timeouts
    /// and the iteration bound all come back as a user-facing response.
    ///
    /// The turn deadline also bounds the wait for the session lock and the
    /// roster lookup behind the prompt.
    pub async fn chat(&self, session_id: &str, message: &str) -> ChatOutcome {
        let deadline = Instant::now() + self.config.turn_timeout;
        let handle = self.sessions.get(session_id);

        let mut session = match timeout_at(deadline, handle.lock()).await {
            Ok(session) => session,
            Err(_) => {
                warn!("Session {} stayed busy past the turn deadline", session_id);
                return self.timed_out(None);
            }
        };

        info!("Chat turn for session {}", session_id);
        session.push(Turn::user(message));

        let mut pending = PendingBatch::default();
        let turn = timeout_at(deadline, async {
            let system = self.system_prompt().await;
            self.run_loop(&mut session, &system, &mut pending).await
        })
        .await;

        match turn {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    "Turn for session {} exceeded {:?}",
                    session_id, self.config.turn_timeout
                );
                let appointment_id = pending.appointment_id();
                if let Some(turns) = pending.take_turns() {
                    session.extend(turns);
                }
                self.timed_out(appointment_id)
            }
        }
    }

    fn timed_out(&self, appointment_id: Option<i64>) -> ChatOutcome {
        ChatOutcome {
            appointment_id,
            ..apology(&format!(
                "the request timed out after {} seconds",
                self.config.turn_timeout.as_secs()
            ))
        }
    }

    async fn system_prompt(&self) -> String {
        let roster = match self.doctors.roster().await {
            Ok(roster) => roster,
            Err(e) => {
                warn!("Could not load the doctor roster for the prompt: {}", e);
                Vec::new()
            }
        };
        build_system_prompt(&roster, self.clock.today())
    }

    async fn run_loop(&self, session: &mut Session, system: &str, pending: &mut PendingBatch) -> ChatOutcome {
        let definitions = self.tools.definitions();
        let mut appointment_id = None;

        for iteration in 1..=self.config.max_iterations {
            let request = ModelRequest {
                system: system.to_string(),
                turns: session.turns().to_vec(),
                tools: definitions.clone(),
            };

            let turn = match self.model.complete(&request).await {
                Ok(turn) => turn,
                Err(e) => {
                    error!("Model call failed on iteration {}: {}", iteration, e);
                    return model_failure(&e);
                }
            };

            if turn.tool_calls.is_empty() {
                let response = turn.content.unwrap_or_default();
                session.push(Turn::model_text(response.clone()));
                debug!("Turn completed after {} model calls", iteration);
                return ChatOutcome {
                    response,
                    appointment_id,
                    status: TurnStatus::Completed,
                };
            }

            debug!(
                "Iteration {}: model requested {} tool calls",
                iteration,
                turn.tool_calls.len()
            );

            pending.start(turn);
            let mut running: FuturesUnordered<_> = pending
                .calls()
                .iter()
                .cloned()
                .enumerate()
                .map(|(index, call)| async move { (index, self.tools.execute(&call).await) })
                .collect();
            while let Some((index, outcome)) = running.next().await {
                pending.record(index, outcome);
            }

            if let Some(id) = pending.appointment_id() {
                appointment_id = Some(id);
            }
            // the model turn and its results land together or not at all
            if let Some(turns) = pending.take_turns() {
                session.extend(turns);
            }
        }

        warn!(
            "Iteration bound of {} reached without a final answer",
            self.config.max_iterations
        );
        ChatOutcome {
            response: self.config.fallback_message.clone(),
            appointment_id: None,
            status: TurnStatus::IterationLimitReached,
        }
    }
}

/// The tool batch in flight. Results are recorded as each call finishes so a
/// turn cut short by the deadline still keeps what already ran.
#[derive(Default)]
struct PendingBatch {
    model: Option<ModelTurn>,
    outcomes: Vec<Option<ToolOutcome>>,
}

impl PendingBatch {
    fn start(&mut self, turn: ModelTurn) {
        self.outcomes = vec![None; turn.tool_calls.len()];
        self.model = Some(turn);
    }

    fn calls(&self) -> &[ToolRequest] {
        self.model.as_ref().map(|turn| turn.tool_calls.as_slice()).unwrap_or(&[])
    }

    fn record(&mut self, index: usize, outcome: ToolOutcome) {
        if let Some(slot) = self.outcomes.get_mut(index) {
            *slot = Some(outcome);
        }
    }

    /// Id of an appointment booked by a finished call in this batch.
    fn appointment_id(&self) -> Option<i64> {
        self.calls()
            .iter()
            .zip(&self.outcomes)
            .filter(|(call, _)| call.name == BOOK_APPOINTMENT)
            .filter_map(|(_, outcome)| outcome.as_ref().and_then(ToolOutcome::appointment_id))
            .last()
    }

    /// The model turn followed by one result per call. Calls that never
    /// finished are reported as failures so the history stays well formed.
    fn take_turns(&mut self) -> Option<Vec<Turn>> {
        let ModelTurn { content, tool_calls } = self.model.take()?;
        let outcomes = std::mem::take(&mut self.outcomes);

        let mut turns = Vec::with_capacity(tool_calls.len() + 1);
        let results: Vec<Turn> = tool_calls
            .iter()
            .zip(outcomes)
            .map(|(call, outcome)| {
                let outcome = outcome.unwrap_or_else(|| ToolOutcome::Failure {
                    kind: ToolErrorKind::TransportFailure,
                    message: format!("{} did not finish before the turn deadline", call.name),
                });
                Turn::tool_result(call, outcome)
            })
            .collect();
        turns.push(Turn::Model { content, tool_calls });
        turns.extend(results);
        Some(turns)
    }
}

fn model_failure(err: &ModelError) -> ChatOutcome {
    apology(&err.to_string())
}

fn apology(reason: &str) -> ChatOutcome {
    ChatOutcome {
        response: format!("I apologize, but I encountered an error: {}", reason),
        appointment_id: None,
        status: TurnStatus::TransportFailure,
    }
}
