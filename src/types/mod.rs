//! Core data types for the Pomodoro bot.
//!
//! This module defines the data structures used for:
//! - Actor identity and session phases
//! - Session snapshots reported to command handlers
//! - Bot commands and IPC request/response serialization

pub mod config;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use config::{BotConfig, ConfigError};

// ============================================================================
// ActorId
// ============================================================================

/// Identity of the entity owning a timer session (a user or a whole guild).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u64);

impl ActorId {
    /// Returns the chat mention form of this actor (`<@id>`).
    pub fn mention(&self) -> String {
        format!("<@{}>", self.0)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ActorId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// ============================================================================
// Phase
// ============================================================================

/// A Pomodoro phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Focused work interval
    #[default]
    Work,
    /// Break interval
    Break,
}

impl Phase {
    /// Returns the string representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Work => "work",
            Phase::Break => "break",
        }
    }

    /// Returns the phase that follows this one.
    pub fn next(&self) -> Phase {
        match self {
            Phase::Work => Phase::Break,
            Phase::Break => Phase::Work,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SessionStatus / SessionSnapshot
// ============================================================================

/// Lifecycle state of a session, independent of its phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No timer yet (or stopped)
    #[default]
    Idle,
    /// Timer counting
    Running,
    /// Timer frozen
    Paused,
}

impl SessionStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Running => "running",
            SessionStatus::Paused => "paused",
        }
    }
}

/// Point-in-time view of a session, as reported by `display`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Owner of the session
    pub actor_id: ActorId,
    /// Current phase
    pub phase: Phase,
    /// Idle / running / paused
    pub status: SessionStatus,
    /// Elapsed time in the current phase (pauses excluded)
    pub elapsed: Duration,
    /// Time left in the current phase
    pub remaining: Duration,
    /// Number of finished work phases
    pub completed_pomodoros: u32,
    /// Set when the completion watcher died and auto-advance is off
    pub watcher_failed: bool,
}

impl SessionSnapshot {
    /// Whole seconds left in the phase, rounded up.
    pub fn remaining_secs(&self) -> u64 {
        self.remaining.as_secs() + u64::from(self.remaining.subsec_nanos() > 0)
    }
}

// ============================================================================
// Command
// ============================================================================

/// Commands accepted from the chat transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    /// Start the timer, or continue a paused one
    Play,
    /// Pause the running timer
    Pause,
    /// Resume a paused timer
    Unpause,
    /// Stop the timer and return to idle
    Stop,
    /// Report elapsed time and phase
    Display,
}

impl Command {
    /// All commands, in help order.
    pub const ALL: [Command; 5] = [
        Command::Play,
        Command::Pause,
        Command::Unpause,
        Command::Stop,
        Command::Display,
    ];

    /// Returns the command name as typed in chat.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Play => "play",
            Command::Pause => "pause",
            Command::Unpause => "unpause",
            Command::Stop => "stop",
            Command::Display => "display",
        }
    }

    /// Returns true if the command only reads session state.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Command::Display)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "play" | "start" => Ok(Command::Play),
            "pause" => Ok(Command::Pause),
            "unpause" | "resume" => Ok(Command::Unpause),
            "stop" => Ok(Command::Stop),
            "display" | "status" => Ok(Command::Display),
            other => Err(format!("Unknown command: {other}")),
        }
    }
}

// ============================================================================
// IPC Types
// ============================================================================

/// IPC request from a transport client to the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpcRequest {
    /// Actor issuing the command
    #[serde(rename = "actorId")]
    pub actor_id: ActorId,
    /// Command to execute
    pub command: Command,
}

impl IpcRequest {
    /// Creates a new request.
    pub fn new(actor_id: impl Into<ActorId>, command: Command) -> Self {
        Self {
            actor_id: actor_id.into(),
            command,
        }
    }
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseData {
    /// Current phase
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// Idle / running / paused
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Elapsed seconds in the current phase
    #[serde(rename = "elapsedSeconds", skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<u64>,
    /// Remaining seconds in the current phase
    #[serde(rename = "remainingSeconds", skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u64>,
    /// Completed pomodoro count
    #[serde(rename = "completedPomodoros", skip_serializing_if = "Option::is_none")]
    pub completed_pomodoros: Option<u32>,
    /// Present (true) when phases no longer advance on their own
    #[serde(rename = "watcherFailed", skip_serializing_if = "Option::is_none")]
    pub watcher_failed: Option<bool>,
}

impl ResponseData {
    /// Creates response data from a session snapshot.
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        Self {
            phase: Some(snapshot.phase.as_str().to_string()),
            state: Some(snapshot.status.as_str().to_string()),
            elapsed_seconds: Some(snapshot.elapsed.as_secs()),
            remaining_seconds: Some(snapshot.remaining_secs()),
            completed_pomodoros: Some(snapshot.completed_pomodoros),
            watcher_failed: snapshot.watcher_failed.then_some(true),
        }
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    /// Returns true if this is a success response.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ============================================================================
// Tests
// ============================================================================
