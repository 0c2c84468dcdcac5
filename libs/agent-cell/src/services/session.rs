use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::Turn;

/// The history of one conversation.
#[derive(Debug)]
pub struct Session {
    turns: Vec<Turn>,
    last_active: Instant,
}

impl Session {
    fn new() -> Self {
        Self {
            turns: Vec::new(),
            last_active: Instant::now(),
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
        self.last_active = Instant::now();
    }

    pub fn extend(&mut self, turns: impl IntoIterator<Item = Turn>) {
        self.turns.extend(turns);
        self.last_active = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_active.elapsed()
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

/// Process-wide session map.
///
/// Different ids never block each other. Each session sits behind its own
/// async mutex so a caller can hold it for a whole chat turn.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, SessionHandle>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create-or-get. Never fails.
    pub fn get(&self, session_id: &str) -> SessionHandle {
        let handle = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                debug!("Creating session {}", session_id);
                Arc::new(Mutex::new(Session::new()))
            });
        Arc::clone(handle.value())
    }

    /// Snapshot of a session's turns, creating the session if needed.
    pub async fn history(&self, session_id: &str) -> Vec<Turn> {
        let handle = self.get(session_id);
        let session = handle.lock().await;
        session.turns().to_vec()
    }

    /// Remove a session. Returns whether it existed; absent ids are not an error.
    pub fn clear(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).is_some();
        if removed {
            info!("Cleared session {}", session_id);
        }
        removed
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop sessions idle for at least `ttl`. Sessions locked by an in-flight
    /// turn are kept.
    pub fn prune_idle(&self, ttl: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => session.idle_for() < ttl,
            Err(_) => true,
        });
        let pruned = before.saturating_sub(self.sessions.len());
        if pruned > 0 {
            info!("Pruned {} idle sessions", pruned);
        }
        pruned
    }
}
