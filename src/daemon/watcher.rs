//! Completion watcher.
//!
//! One tokio task per live timer. The task wakes every poll interval, checks
//! whether its timer instance is still the session's current one, and when
//! the timer has completed it advances the session's phase and emits a
//! [`PhaseEvent`]. After an advance the same task keeps watching the timer
//! that replaced the finished one.
//!
//! A watcher holds only a `Weak` reference to its session. Stopping the
//! session aborts the task and bumps the session's generation, so a watcher
//! that wakes late sees a stale generation and exits without notifying.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{interval, MissedTickBehavior};
use uuid::Uuid;

use crate::types::{ActorId, Phase};

use super::session::{PhaseTransition, PomodoroSession};

// ============================================================================
// PhaseEvent
// ============================================================================

/// Emitted once per completed phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseEvent {
    /// Unique id of this notification
    pub id: Uuid,
    /// Session owner
    pub actor_id: ActorId,
    /// Phase that finished
    pub ended_phase: Phase,
    /// Phase that started
    pub next_phase: Phase,
    /// Work phases finished so far
    pub completed_pomodoros: u32,
}

impl PhaseEvent {
    /// Builds the event for a transition of `actor_id`'s session.
    pub fn from_transition(actor_id: ActorId, transition: &PhaseTransition) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_id,
            ended_phase: transition.ended,
            next_phase: transition.next,
            completed_pomodoros: transition.completed_pomodoros,
        }
    }
}

// ============================================================================
// Watcher
// ============================================================================

/// Why a watcher task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchExit {
    /// The session stopped or replaced the timer being watched.
    Superseded,
    /// The session itself was dropped.
    SessionDropped,
}

/// Spawns a watcher for the timer armed as `generation`.
///
/// Returns the handle the session uses to cancel the watcher on `stop`.
/// A supervisor task logs abnormal exits and flags the session when the
/// watcher panics.
pub fn spawn_watcher(
    session: Weak<Mutex<PomodoroSession>>,
    generation: u64,
    events: mpsc::UnboundedSender<PhaseEvent>,
    poll_interval: Duration,
) -> AbortHandle {
    let watching = Arc::new(AtomicU64::new(generation));
    let task = tokio::spawn(watch(
        session.clone(),
        watching.clone(),
        events,
        poll_interval,
    ));
    let abort = task.abort_handle();
    tokio::spawn(supervise(task, session, watching));
    abort
}

async fn watch(
    session: Weak<Mutex<PomodoroSession>>,
    watching: Arc<AtomicU64>,
    events: mpsc::UnboundedSender<PhaseEvent>,
    poll_interval: Duration,
) -> WatchExit {
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let Some(shared) = session.upgrade() else {
            return WatchExit::SessionDropped;
        };

        let generation = watching.load(Ordering::SeqCst);
        let (actor_id, transition) = {
            let mut guard = shared.lock().await;
            if guard.generation() != generation {
                return WatchExit::Superseded;
            }
            match guard.advance_phase(generation) {
                Some(transition) => (guard.actor_id(), transition),
                None => continue,
            }
        };

        watching.store(transition.generation, Ordering::SeqCst);
        tracing::info!(
            actor = %actor_id,
            ended = %transition.ended,
            next = %transition.next,
            "phase completed"
        );

        let event = PhaseEvent::from_transition(actor_id, &transition);
        if events.send(event).is_err() {
            tracing::warn!(actor = %actor_id, "notification channel closed, phase-end notice dropped");
        }
    }
}

async fn supervise<T: std::fmt::Debug>(
    task: JoinHandle<T>,
    session: Weak<Mutex<PomodoroSession>>,
    watching: Arc<AtomicU64>,
) {
    match task.await {
        Ok(exit) => tracing::debug!(?exit, "completion watcher finished"),
        Err(e) if e.is_cancelled() => tracing::debug!("completion watcher cancelled"),
        Err(e) => {
            let generation = watching.load(Ordering::SeqCst);
            tracing::error!(generation, "completion watcher failed: {e}; auto-advance disabled");
            if let Some(shared) = session.upgrade() {
                shared.lock().await.mark_watcher_failed(generation);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
