//! Error types for timers and sessions.
//!
//! Every variant here is recoverable: command handlers translate them into
//! chat replies and the session carries on in its previous state.

use thiserror::Error;

use crate::types::ActorId;

/// A timer operation was invoked in a state that forbids it.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// The timer has not been started.
    #[error("timer has not been started")]
    NotStarted,

    /// The timer is already counting.
    #[error("timer is already running")]
    AlreadyRunning,

    /// The timer is already paused.
    #[error("timer is already paused")]
    AlreadyPaused,

    /// The timer is running, not paused.
    #[error("timer is not paused")]
    NotPaused,
}

/// Errors surfaced by session and registry operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The underlying timer rejected the operation.
    #[error("invalid state: {0}")]
    InvalidState(#[from] TimerError),

    /// No session exists for the actor.
    #[error("no timer running for actor {0}")]
    NotFound(ActorId),
}

impl SessionError {
    /// Returns true for invalid-state errors.
    #[must_use]
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState(_))
    }

    /// Returns true if the actor has no session.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
