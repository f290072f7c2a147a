//! Per-actor Pomodoro session.
//!
//! [`PomodoroSession`] is the synchronous state machine: it owns at most one
//! [`Timer`], knows the current phase, and flips the phase when a timer
//! completes. [`SessionHandle`] is the shareable face used by command
//! handlers; it serializes access through a mutex and arms the completion
//! watcher whenever a fresh timer starts.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::AbortHandle;

use crate::types::{ActorId, BotConfig, Phase, SessionSnapshot, SessionStatus};

use super::clock::Clock;
use super::error::{SessionError, TimerError};
use super::timer::{Timer, TimerStatus};
use super::watcher::{self, PhaseEvent};

/// Session shared between command handlers and its watcher.
pub type SharedSession = Arc<Mutex<PomodoroSession>>;

// ============================================================================
// Outcomes
// ============================================================================

/// What `play` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A fresh timer started; a watcher must be armed for `generation`.
    Started {
        /// Identity of the new timer instance
        generation: u64,
    },
    /// A paused timer continued; its watcher is still armed.
    Resumed,
}

/// Result of a completed phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    /// Phase that just finished
    pub ended: Phase,
    /// Phase now running
    pub next: Phase,
    /// Identity of the timer that replaced the finished one
    pub generation: u64,
    /// Work phases finished so far
    pub completed_pomodoros: u32,
}

// ============================================================================
// PomodoroSession
// ============================================================================

/// Timer state for a single actor.
#[derive(Debug)]
pub struct PomodoroSession {
    actor_id: ActorId,
    phase: Phase,
    work_duration: Duration,
    break_duration: Duration,
    clock: Arc<dyn Clock>,
    timer: Option<Timer>,
    /// Bumped every time the timer is replaced or discarded
    generation: u64,
    completed_pomodoros: u32,
    watcher: Option<AbortHandle>,
    watcher_failed: bool,
}

impl PomodoroSession {
    /// Creates an idle session in the work phase.
    pub fn new(actor_id: ActorId, config: &BotConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            actor_id,
            phase: Phase::Work,
            work_duration: config.work_duration(),
            break_duration: config.break_duration(),
            clock,
            timer: None,
            generation: 0,
            completed_pomodoros: 0,
            watcher: None,
            watcher_failed: false,
        }
    }

    fn duration_for(&self, phase: Phase) -> Duration {
        match phase {
            Phase::Work => self.work_duration,
            Phase::Break => self.break_duration,
        }
    }

    fn install_fresh_timer(&mut self) -> u64 {
        let timer = Timer::started(self.clock.clone(), self.duration_for(self.phase));
        self.timer = Some(timer);
        self.generation += 1;
        self.generation
    }

    /// Starts the timer for the current phase, or continues a paused one.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::AlreadyRunning`] if the timer is counting.
    pub fn start_phase_timer(&mut self) -> Result<StartOutcome, SessionError> {
        let status = self.timer.as_ref().map(Timer::status);
        match status {
            Some(TimerStatus::Running) => Err(TimerError::AlreadyRunning.into()),
            Some(TimerStatus::Paused) => {
                if let Some(timer) = self.timer.as_mut() {
                    timer.resume()?;
                }
                tracing::debug!(actor = %self.actor_id, phase = %self.phase, "timer resumed via play");
                Ok(StartOutcome::Resumed)
            }
            Some(TimerStatus::NotStarted) | None => {
                let generation = self.install_fresh_timer();
                self.watcher_failed = false;
                tracing::debug!(actor = %self.actor_id, phase = %self.phase, generation, "timer started");
                Ok(StartOutcome::Started { generation })
            }
        }
    }

    /// Pauses the running timer.
    ///
    /// # Errors
    ///
    /// Returns an invalid-state error if there is no running timer.
    pub fn pause_timer(&mut self) -> Result<(), SessionError> {
        let timer = self.timer.as_mut().ok_or(TimerError::NotStarted)?;
        timer.pause()?;
        tracing::debug!(actor = %self.actor_id, "timer paused");
        Ok(())
    }

    /// Resumes the paused timer.
    ///
    /// # Errors
    ///
    /// Returns an invalid-state error if there is no paused timer.
    pub fn resume_timer(&mut self) -> Result<(), SessionError> {
        let timer = self.timer.as_mut().ok_or(TimerError::NotStarted)?;
        timer.resume()?;
        tracing::debug!(actor = %self.actor_id, "timer resumed");
        Ok(())
    }

    /// Stops the timer, cancels its watcher and returns to an idle work phase.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::NotStarted`] if there is no timer.
    pub fn stop_timer(&mut self) -> Result<(), SessionError> {
        let timer = self.timer.as_mut().ok_or(TimerError::NotStarted)?;
        timer.stop()?;

        self.timer = None;
        self.generation += 1;
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
        self.phase = Phase::Work;
        self.watcher_failed = false;
        tracing::debug!(actor = %self.actor_id, generation = self.generation, "timer stopped");
        Ok(())
    }

    /// Moves to the next phase if the timer armed as `generation` has completed.
    ///
    /// Returns `None` when `generation` is stale or the timer is not done, so
    /// a watcher can call this on every wake.
    pub fn advance_phase(&mut self, generation: u64) -> Option<PhaseTransition> {
        if generation != self.generation {
            return None;
        }
        if !self.timer.as_ref().is_some_and(Timer::is_complete) {
            return None;
        }

        let ended = self.phase;
        if ended == Phase::Work {
            self.completed_pomodoros += 1;
        }
        self.phase = ended.next();
        let generation = self.install_fresh_timer();

        Some(PhaseTransition {
            ended,
            next: self.phase,
            generation,
            completed_pomodoros: self.completed_pomodoros,
        })
    }

    /// Records the abort handle of the watcher for the current timer.
    pub fn set_watcher(&mut self, watcher: AbortHandle) {
        if let Some(previous) = self.watcher.replace(watcher) {
            previous.abort();
        }
    }

    /// Flags that the watcher for `generation` died; auto-advance is off
    /// until the next fresh start.
    pub fn mark_watcher_failed(&mut self, generation: u64) {
        if generation == self.generation {
            self.watcher = None;
            self.watcher_failed = true;
        }
    }

    /// Elapsed time in the current phase, zero before the first `play`.
    pub fn elapsed_in_current_phase(&self) -> Duration {
        self.timer.as_ref().map(Timer::elapsed).unwrap_or_default()
    }

    /// Idle, running or paused.
    pub fn status(&self) -> SessionStatus {
        match self.timer.as_ref().map(Timer::status) {
            Some(TimerStatus::Running) => SessionStatus::Running,
            Some(TimerStatus::Paused) => SessionStatus::Paused,
            Some(TimerStatus::NotStarted) | None => SessionStatus::Idle,
        }
    }

    /// Point-in-time view for display.
    pub fn snapshot(&self) -> SessionSnapshot {
        let remaining = self
            .timer
            .as_ref()
            .map(Timer::remaining)
            .unwrap_or_else(|| self.duration_for(self.phase));

        SessionSnapshot {
            actor_id: self.actor_id,
            phase: self.phase,
            status: self.status(),
            elapsed: self.elapsed_in_current_phase(),
            remaining,
            completed_pomodoros: self.completed_pomodoros,
            watcher_failed: self.watcher_failed,
        }
    }

    /// Owner of this session.
    pub fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Identity of the current timer instance.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Work phases finished so far.
    pub fn completed_pomodoros(&self) -> u32 {
        self.completed_pomodoros
    }

    /// The owned timer, if any.
    pub fn timer(&self) -> Option<&Timer> {
        self.timer.as_ref()
    }
}

// ============================================================================
// SessionHandle
// ============================================================================

/// Cloneable handle to a session, used by command handlers.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inner: SharedSession,
    events: mpsc::UnboundedSender<PhaseEvent>,
    poll_interval: Duration,
}

impl SessionHandle {
    /// Wraps a session. Phase-end events go to `events`.
    pub fn new(
        session: PomodoroSession,
        events: mpsc::UnboundedSender<PhaseEvent>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
            events,
            poll_interval,
        }
    }

    /// `play`: starts (arming a watcher) or continues the timer.
    pub async fn play(&self) -> Result<(StartOutcome, SessionSnapshot), SessionError> {
        let mut session = self.inner.lock().await;
        let outcome = session.start_phase_timer()?;

        if let StartOutcome::Started { generation } = outcome {
            let watcher = watcher::spawn_watcher(
                Arc::downgrade(&self.inner),
                generation,
                self.events.clone(),
                self.poll_interval,
            );
            session.set_watcher(watcher);
        }

        Ok((outcome, session.snapshot()))
    }

    /// `pause`.
    pub async fn pause(&self) -> Result<SessionSnapshot, SessionError> {
        let mut session = self.inner.lock().await;
        session.pause_timer()?;
        Ok(session.snapshot())
    }

    /// `unpause`.
    pub async fn unpause(&self) -> Result<SessionSnapshot, SessionError> {
        let mut session = self.inner.lock().await;
        session.resume_timer()?;
        Ok(session.snapshot())
    }

    /// `stop`. Returns the snapshot taken just before stopping.
    pub async fn stop(&self) -> Result<SessionSnapshot, SessionError> {
        let mut session = self.inner.lock().await;
        let before = session.snapshot();
        session.stop_timer()?;
        Ok(before)
    }

    /// `display`.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().await.snapshot()
    }

    /// Returns true if both handles refer to the same session.
    pub fn ptr_eq(&self, other: &SessionHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }}

// ============================================================================
// Tests
// ============================================================================
