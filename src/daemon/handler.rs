//! Command handler.
//!
//! Translates transport commands into session calls and every outcome into
//! a deterministic reply. `display` looks sessions up without creating them;
//! every other command creates the actor's session on first use.

use std::sync::Arc;
use std::time::Duration;

use crate::types::{ActorId, Command, IpcResponse, ResponseData, SessionSnapshot};

use super::error::{SessionError, TimerError};
use super::registry::SessionRegistry;
use super::session::StartOutcome;

// ============================================================================
// CommandReply
// ============================================================================

/// Result of one command, ready to be rendered by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    /// Actor that issued the command
    pub actor_id: ActorId,
    /// The command
    pub command: Command,
    /// Session state after the command (before it, for `stop`), or the error
    pub outcome: Result<SessionSnapshot, SessionError>,
    /// User-facing text
    pub message: String,
}

impl CommandReply {
    /// Returns true if the command succeeded.
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The error, if the command failed.
    pub fn error(&self) -> Option<&SessionError> {
        self.outcome.as_ref().err()
    }
}

impl From<CommandReply> for IpcResponse {
    fn from(reply: CommandReply) -> Self {
        match reply.outcome {
            Ok(snapshot) => {
                IpcResponse::success(reply.message, Some(ResponseData::from_snapshot(&snapshot)))
            }
            Err(_) => IpcResponse::error(reply.message),
        }
    }
}

// ============================================================================
// CommandHandler
// ============================================================================

/// Dispatches commands against a shared registry.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    registry: Arc<SessionRegistry>,
}

impl CommandHandler {
    /// Creates a handler over the given registry.
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this handler dispatches to.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Executes `command` for `actor_id`.
    pub async fn handle(&self, actor_id: ActorId, command: Command) -> CommandReply {
        tracing::debug!(actor = %actor_id, %command, "handling command");

        let handle = if command.is_read_only() {
            self.registry.get(actor_id).await
        } else {
            Some(self.registry.get_or_create(actor_id).await)
        };

        let mut started = None;
        let outcome = match handle {
            None => Err(SessionError::NotFound(actor_id)),
            Some(handle) => match command {
                Command::Play => handle.play().await.map(|(how, snapshot)| {
                    started = Some(how);
                    snapshot
                }),
                Command::Pause => handle.pause().await,
                Command::Unpause => handle.unpause().await,
                Command::Stop => handle.stop().await,
                Command::Display => Ok(handle.snapshot().await),
            },
        };

        let message = match &outcome {
            Ok(snapshot) => success_message(command, snapshot, started),
            Err(err) => {
                tracing::debug!(actor = %actor_id, %command, "command rejected: {err}");
                error_message(command, actor_id, err)
            }
        };

        CommandReply {
            actor_id,
            command,
            outcome,
            message,
        }
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Formats a span as `mm:ss` (minutes are not wrapped at an hour).
pub fn format_clock(span: Duration) -> String {
    let total = span.as_secs();
    format!("{}:{:02}", total / 60, total % 60)
}

fn success_message(
    command: Command,
    snapshot: &SessionSnapshot,
    started: Option<StartOutcome>,
) -> String {
    let who = snapshot.actor_id.mention();
    match command {
        Command::Play => match started {
            Some(StartOutcome::Resumed) => format!("Resumed {} timer for {who}", snapshot.phase),
            _ => format!("Started {} timer for {who}", snapshot.phase),
        },
        Command::Pause => format!(
            "Paused {} timer for {who} at {}",
            snapshot.phase,
            format_clock(snapshot.elapsed)
        ),
        Command::Unpause => format!("Resumed {} timer for {who}", snapshot.phase),
        Command::Stop => format!("Stopped timer for {who}"),
        Command::Display => {
            let mut message = format!(
                "{who} is in the {} phase: {} elapsed, {} left ({})",
                snapshot.phase,
                format_clock(snapshot.elapsed),
                format_clock(Duration::from_secs(snapshot.remaining_secs())),
                snapshot.status.as_str()
            );
            if snapshot.watcher_failed {
                message.push_str("; phases will not advance on their own, stop and play to recover");
            }
            message
        }
    }
}

fn error_message(command: Command, actor_id: ActorId, err: &SessionError) -> String {
    let who = actor_id.mention();
    match err {
        SessionError::NotFound(_) => format!("No timer running for {who}"),
        SessionError::InvalidState(TimerError::AlreadyRunning) => {
            format!("Timer is already running for {who}")
        }
        SessionError::InvalidState(TimerError::AlreadyPaused) => {
            format!("Timer is already paused for {who}")
        }
        SessionError::InvalidState(TimerError::NotPaused) => {
            format!("Timer is not paused for {who}")
        }
        SessionError::InvalidState(TimerError::NotStarted) => {
            format!("Nothing to {command} for {who}")
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::clock::TokioClock;
    use crate::types::{BotConfig, Phase, SessionStatus};
    use tokio::sync::mpsc;
    use tokio::time::sleep;

    fn create_handler() -> CommandHandler {
        let (tx, _rx) = mpsc::unbounded_channel();
        let config = BotConfig::default()
            .with_durations(Duration::from_secs(2), Duration::from_secs(5))
            .with_poll_interval_ms(100);
        let registry = SessionRegistry::with_clock(config, Arc::new(TokioClock), tx);
        CommandHandler::new(Arc::new(registry))
    }

    const ACTOR: ActorId = ActorId(555);

    // ------------------------------------------------------------------------
    // Message Tests
    // ------------------------------------------------------------------------

    mod message_tests {
        use super::*;

        #[test]
        fn test_format_clock() {
            assert_eq!(format_clock(Duration::ZERO), "0:00");
            assert_eq!(format_clock(Duration::from_millis(61_999)), "1:01");
            assert_eq!(format_clock(Duration::from_secs(25 * 60)), "25:00");
            assert_eq!(format_clock(Duration::from_secs(2 * 3600 + 5)), "120:05");
        }

        #[test]
        fn test_every_error_has_a_distinct_message() {
            let errors = [
                SessionError::NotFound(ACTOR),
                TimerError::AlreadyRunning.into(),
                TimerError::AlreadyPaused.into(),
                TimerError::NotPaused.into(),
                TimerError::NotStarted.into(),
            ];
            let mut messages: Vec<_> = errors
                .iter()
                .map(|e| error_message(Command::Pause, ACTOR, e))
                .collect();
            messages.sort();
            messages.dedup();
            assert_eq!(messages.len(), errors.len());
        }

        #[test]
        fn test_not_started_names_the_command() {
            let err = SessionError::from(TimerError::NotStarted);
            assert_eq!(
                error_message(Command::Pause, ACTOR, &err),
                "Nothing to pause for <@555>"
            );
            assert_eq!(
                error_message(Command::Stop, ACTOR, &err),
                "Nothing to stop for <@555>"
            );
        }

        fn running_snapshot(remaining: Duration) -> SessionSnapshot {
            SessionSnapshot {
                actor_id: ACTOR,
                phase: Phase::Work,
                status: SessionStatus::Running,
                elapsed: Duration::from_secs(1500) - remaining,
                remaining,
                completed_pomodoros: 0,
                watcher_failed: false,
            }
        }

        #[test]
        fn test_display_rounds_time_left_up() {
            let snapshot = running_snapshot(Duration::from_millis(1_499_998));
            assert_eq!(
                success_message(Command::Display, &snapshot, None),
                "<@555> is in the work phase: 0:00 elapsed, 25:00 left (running)"
            );
        }

        #[test]
        fn test_display_mentions_failed_watcher() {
            let snapshot = SessionSnapshot {
                watcher_failed: true,
                ..running_snapshot(Duration::from_secs(60))
            };
            let message = success_message(Command::Display, &snapshot, None);
            assert!(message.starts_with("<@555> is in the work phase: 24:00 elapsed, 1:00 left (running)"));
            assert!(message.ends_with("phases will not advance on their own, stop and play to recover"));

            let healthy = running_snapshot(Duration::from_secs(60));
            assert!(!success_message(Command::Display, &healthy, None).contains("advance"));
        }
    }

    // ------------------------------------------------------------------------
    // Dispatch Tests
    // ------------------------------------------------------------------------

    mod dispatch_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_display_without_session_reports_not_found() {
            let handler = create_handler();

            let reply = handler.handle(ACTOR, Command::Display).await;

            assert_eq!(reply.error(), Some(&SessionError::NotFound(ACTOR)));
            assert_eq!(reply.message, "No timer running for <@555>");
            assert!(handler.registry().get(ACTOR).await.is_none());
        }

        #[tokio::test(start_paused = true)]
        async fn test_pause_without_timer_creates_idle_session() {
            let handler = create_handler();

            let reply = handler.handle(ACTOR, Command::Pause).await;

            assert_eq!(
                reply.error(),
                Some(&SessionError::InvalidState(TimerError::NotStarted))
            );
            assert_eq!(reply.message, "Nothing to pause for <@555>");
            let session = handler.registry().get(ACTOR).await.unwrap();
            assert_eq!(session.snapshot().await.status, SessionStatus::Idle);
        }

        #[tokio::test(start_paused = true)]
        async fn test_full_command_flow() {
            let handler = create_handler();

            let reply = handler.handle(ACTOR, Command::Play).await;
            assert!(reply.is_ok());
            assert_eq!(reply.message, "Started work timer for <@555>");

            sleep(Duration::from_secs(1)).await;
            let reply = handler.handle(ACTOR, Command::Pause).await;
            assert_eq!(reply.message, "Paused work timer for <@555> at 0:01");

            let reply = handler.handle(ACTOR, Command::Pause).await;
            assert_eq!(reply.message, "Timer is already paused for <@555>");

            let reply = handler.handle(ACTOR, Command::Play).await;
            assert_eq!(reply.message, "Resumed work timer for <@555>");

            let reply = handler.handle(ACTOR, Command::Unpause).await;
            assert_eq!(reply.message, "Timer is not paused for <@555>");

            let reply = handler.handle(ACTOR, Command::Display).await;
            assert_eq!(
                reply.message,
                "<@555> is in the work phase: 0:01 elapsed, 0:01 left (running)"
            );

            let reply = handler.handle(ACTOR, Command::Stop).await;
            assert_eq!(reply.message, "Stopped timer for <@555>");

            let reply = handler.handle(ACTOR, Command::Stop).await;
            assert_eq!(reply.message, "Nothing to stop for <@555>");
        }

        #[tokio::test(start_paused = true)]
        async fn test_repeated_display_is_non_decreasing() {
            let handler = create_handler();
            handler.handle(ACTOR, Command::Play).await;
            sleep(Duration::from_millis(700)).await;

            let first = handler.handle(ACTOR, Command::Display).await.outcome.unwrap();
            let second = handler.handle(ACTOR, Command::Display).await.outcome.unwrap();

            assert_eq!(first.phase, second.phase);
            assert!(second.elapsed >= first.elapsed);
        }

        #[tokio::test(start_paused = true)]
        async fn test_display_after_phase_change() {
            let handler = create_handler();
            handler.handle(ACTOR, Command::Play).await;
            sleep(Duration::from_secs(3)).await;

            let snapshot = handler.handle(ACTOR, Command::Display).await.outcome.unwrap();

            assert_eq!(snapshot.phase, Phase::Break);
            assert_eq!(snapshot.completed_pomodoros, 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_reply_into_ipc_response() {
            let handler = create_handler();

            let ok: IpcResponse = handler.handle(ACTOR, Command::Play).await.into();
            assert!(ok.is_success());
            let data = ok.data.unwrap();
            assert_eq!(data.phase.as_deref(), Some("work"));
            assert_eq!(data.state.as_deref(), Some("running"));

            let err: IpcResponse = handler.handle(ACTOR, Command::Play).await.into();
            assert!(!err.is_success());
            assert_eq!(err.message, "Timer is already running for <@555>");
            assert!(err.data.is_none());
        }
    }
}
