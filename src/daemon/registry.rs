//! Session registry.
//!
//! Maps each actor to its session. Owned by the application root and handed
//! to command handlers; sessions are created on first touch and live for the
//! rest of the process.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

use crate::types::{ActorId, BotConfig};

use super::clock::{Clock, TokioClock};
use super::session::{PomodoroSession, SessionHandle};
use super::watcher::PhaseEvent;

/// Actor id → session map.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<ActorId, SessionHandle>>,
    config: BotConfig,
    clock: Arc<dyn Clock>,
    events: mpsc::UnboundedSender<PhaseEvent>,
}

impl SessionRegistry {
    /// Creates an empty registry using tokio's clock.
    pub fn new(config: BotConfig, events: mpsc::UnboundedSender<PhaseEvent>) -> Self {
        Self::with_clock(config, Arc::new(TokioClock), events)
    }

    /// Creates an empty registry with a custom clock.
    pub fn with_clock(
        config: BotConfig,
        clock: Arc<dyn Clock>,
        events: mpsc::UnboundedSender<PhaseEvent>,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
            clock,
            events,
        }
    }

    /// Returns the actor's session, creating an idle one if absent.
    ///
    /// Concurrent first-touch calls for the same actor all receive the same
    /// session.
    pub async fn get_or_create(&self, actor_id: ActorId) -> SessionHandle {
        if let Some(handle) = self.sessions.read().await.get(&actor_id) {
            return handle.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(actor_id)
            .or_insert_with(|| {
                tracing::debug!(actor = %actor_id, "creating session");
                let session = PomodoroSession::new(actor_id, &self.config, self.clock.clone());
                SessionHandle::new(session, self.events.clone(), self.config.poll_interval())
            })
            .clone()
    }

    /// Returns the actor's session without creating one.
    pub async fn get(&self, actor_id: ActorId) -> Option<SessionHandle> {
        self.sessions.read().await.get(&actor_id).cloned()
    }

    /// Number of sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns true if no actor has a session yet.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Actors with a session, sorted.
    pub async fn actors(&self) -> Vec<ActorId> {
        let mut actors: Vec<_> = self.sessions.read().await.keys().copied().collect();
        actors.sort();
        actors
    }}
