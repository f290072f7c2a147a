//! Phase timer for the Pomodoro bot.
//!
//! A [`Timer`] measures how much of a single phase has elapsed:
//! - State transitions (NotStarted → Running ⇄ Paused → NotStarted)
//! - Elapsed time excluding every paused interval, including a pause in progress
//! - Completion detection against a fixed duration
//!
//! The timer owns no task and never sleeps. Waiting for completion is the
//! watcher's job (see [`crate::daemon::watcher`]).

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::clock::Clock;
use super::error::TimerError;

// ============================================================================
// TimerStatus
// ============================================================================

/// Which of the three timer states currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    /// Never started, or stopped
    NotStarted,
    /// Counting
    Running,
    /// Frozen until resumed
    Paused,
}

// ============================================================================
// Timer
// ============================================================================

/// Elapsed-time tracker for one phase.
#[derive(Debug, Clone)]
pub struct Timer {
    /// Time source
    clock: Arc<dyn Clock>,
    /// Length of the phase
    duration: Duration,
    /// When the timer was started
    started_at: Option<Instant>,
    /// When the current pause began
    paused_at: Option<Instant>,
    /// Sum of all finished pauses
    accumulated_pause: Duration,
}

impl Timer {
    /// Creates a not-started timer for a phase of the given length.
    pub fn new(clock: Arc<dyn Clock>, duration: Duration) -> Self {
        Self {
            clock,
            duration,
            started_at: None,
            paused_at: None,
            accumulated_pause: Duration::ZERO,
        }
    }

    /// Creates a timer that is already running from now.
    pub fn started(clock: Arc<dyn Clock>, duration: Duration) -> Self {
        let started_at = Some(clock.now());
        Self {
            clock,
            duration,
            started_at,
            paused_at: None,
            accumulated_pause: Duration::ZERO,
        }
    }

    /// Starts the timer.
    ///
    /// Starting a paused timer restarts it from zero.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::AlreadyRunning`] if the timer is running.
    pub fn start(&mut self) -> Result<(), TimerError> {
        if self.status() == TimerStatus::Running {
            return Err(TimerError::AlreadyRunning);
        }

        self.started_at = Some(self.clock.now());
        self.paused_at = None;
        self.accumulated_pause = Duration::ZERO;
        Ok(())
    }

    /// Pauses the timer.
    ///
    /// # Errors
    ///
    /// Returns an error if the timer is not started or already paused.
    pub fn pause(&mut self) -> Result<(), TimerError> {
        match self.status() {
            TimerStatus::NotStarted => Err(TimerError::NotStarted),
            TimerStatus::Paused => Err(TimerError::AlreadyPaused),
            TimerStatus::Running => {
                self.paused_at = Some(self.clock.now());
                Ok(())
            }
        }
    }

    /// Resumes a paused timer.
    ///
    /// # Errors
    ///
    /// Returns an error if the timer is not paused.
    pub fn resume(&mut self) -> Result<(), TimerError> {
        match (self.status(), self.paused_at) {
            (TimerStatus::NotStarted, _) => Err(TimerError::NotStarted),
            (TimerStatus::Paused, Some(paused_at)) => {
                let paused_for = self.clock.now().saturating_duration_since(paused_at);
                self.accumulated_pause += paused_for;
                self.paused_at = None;
                Ok(())
            }
            _ => Err(TimerError::NotPaused),
        }
    }

    /// Stops the timer and clears all state.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::NotStarted`] if the timer was never started.
    pub fn stop(&mut self) -> Result<(), TimerError> {
        if self.started_at.is_none() {
            return Err(TimerError::NotStarted);
        }

        self.started_at = None;
        self.paused_at = None;
        self.accumulated_pause = Duration::ZERO;
        Ok(())
    }

    /// Alias for [`Timer::stop`].
    pub fn reset(&mut self) -> Result<(), TimerError> {
        self.stop()
    }

    /// Time counted so far, excluding paused intervals.
    pub fn elapsed(&self) -> Duration {
        let Some(started_at) = self.started_at else {
            return Duration::ZERO;
        };

        // A pause in progress freezes the end of the measured span.
        let end = self.paused_at.unwrap_or_else(|| self.clock.now());
        end.saturating_duration_since(started_at)
            .saturating_sub(self.accumulated_pause)
    }

    /// Time left before the phase completes.
    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.elapsed())
    }

    /// Returns true once the elapsed time reaches the duration.
    pub fn is_complete(&self) -> bool {
        self.elapsed() >= self.duration
    }

    /// Returns the current state.
    pub fn status(&self) -> TimerStatus {
        match (self.started_at, self.paused_at) {
            (None, _) => TimerStatus::NotStarted,
            (Some(_), None) => TimerStatus::Running,
            (Some(_), Some(_)) => TimerStatus::Paused,
        }
    }

    /// Returns true if the timer is counting.
    pub fn is_running(&self) -> bool {
        self.status() == TimerStatus::Running
    }

    /// Returns true if the timer is paused.
    pub fn is_paused(&self) -> bool {
        self.status() == TimerStatus::Paused
    }

    /// Length of the phase.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Start instant, if started.
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Start of the current pause, if paused.
    pub fn paused_at(&self) -> Option<Instant> {
        self.paused_at
    }

    /// Sum of finished pauses.
    pub fn accumulated_pause(&self) -> Duration {
        self.accumulated_pause
    }
}

// ============================================================================
// Tests
// ============================================================================
