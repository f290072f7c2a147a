//! Daemon module for pomobot.
//!
//! This module contains the timer core and the socket daemon:
//! - `clock`: Monotonic time sources (tokio's clock, manual test clock)
//! - `timer`: Pausable single-phase timer
//! - `session`: Per-actor work/break session and its shared handle
//! - `watcher`: Completion watcher tasks that advance phases
//! - `registry`: Actor id to session map
//! - `handler`: Command dispatch and reply messages
//! - `ipc`: Unix socket server and daemon loop

pub mod clock;
pub mod error;
pub mod handler;
pub mod ipc;
pub mod registry;
pub mod session;
pub mod timer;
pub mod watcher;

pub use clock::{Clock, ManualClock, TokioClock};
pub use error::{SessionError, TimerError};
pub use handler::{format_clock, CommandHandler, CommandReply};
pub use ipc::{
    default_socket_path, run_daemon, run_daemon_until, IpcError, IpcServer, RequestHandler,
};
pub use registry::SessionRegistry;
pub use session::{PhaseTransition, PomodoroSession, SessionHandle, StartOutcome};
pub use timer::{Timer, TimerStatus};
pub use watcher::{spawn_watcher, PhaseEvent};
