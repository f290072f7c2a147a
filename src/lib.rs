//! pomobot library
//!
//! Per-actor pomodoro timers for chat bots. It includes:
//! - A pausable timer and the work/break session built on it
//! - Completion watchers that advance phases and emit notices
//! - A session registry and command handler shared by every transport
//! - IPC server/client for daemon-CLI communication
//! - A line-based chat front end
//! - Type definitions for configuration and the wire format

pub mod cli;
pub mod daemon;
pub mod notification;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    ActorId, BotConfig, Command, ConfigError, IpcRequest, IpcResponse, Phase, ResponseData,
    SessionSnapshot, SessionStatus,
};

pub use daemon::{
    CommandHandler, CommandReply, PhaseEvent, SessionError, SessionRegistry, TimerError,
};

pub use notification::{
    dispatch_notifications, render_phase_message, ConsoleNotificationSender,
    LogNotificationSender, MockNotificationSender, NotificationError, NotificationSender,
};
