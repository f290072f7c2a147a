//! Component integration tests.
//!
//! Wire the registry, command handler, completion watchers and notification
//! dispatcher together the way the daemon does, and drive them with tokio's
//! paused clock.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;

use pomobot::daemon::{CommandHandler, SessionRegistry};
use pomobot::notification::{dispatch_notifications, MockNotificationSender};
use pomobot::types::{ActorId, BotConfig, Command, Phase, SessionStatus};

const POLL: Duration = Duration::from_millis(100);

/// Work 2s, break 1s, polled every 100ms.
fn create_fast_config() -> BotConfig {
    BotConfig::default()
        .with_durations(Duration::from_secs(2), Duration::from_secs(1))
        .with_poll_interval_ms(POLL.as_millis() as u64)
}

struct Harness {
    handler: CommandHandler,
    notifier: Arc<MockNotificationSender>,
}

fn create_harness(config: BotConfig) -> Harness {
    let (tx, rx) = mpsc::unbounded_channel();
    let notifier = Arc::new(MockNotificationSender::new());
    tokio::spawn(dispatch_notifications(rx, notifier.clone()));
    let registry = Arc::new(SessionRegistry::new(config, tx));
    Harness {
        handler: CommandHandler::new(registry),
        notifier,
    }
}

impl Harness {
    async fn run(&self, actor: u64, command: Command) -> pomobot::CommandReply {
        self.handler.handle(ActorId(actor), command).await
    }

    async fn status(&self, actor: u64) -> pomobot::SessionSnapshot {
        self.run(actor, Command::Display).await.outcome.unwrap()
    }
}

// ============================================================================
// Phase Completion
// ============================================================================

mod phase_completion {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn work_phase_completes_into_break() {
        let h = create_harness(create_fast_config());
        h.run(1, Command::Play).await;

        sleep(Duration::from_millis(2500)).await;

        let status = h.status(1).await;
        assert_eq!(status.phase, Phase::Break);
        assert_eq!(status.status, SessionStatus::Running);
        assert_eq!(status.completed_pomodoros, 1);
        assert_eq!(
            h.notifier.messages(),
            vec!["<@1> work phase complete, time for a break! (1 pomodoro done)"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn phases_keep_alternating() {
        let h = create_harness(create_fast_config());
        h.run(1, Command::Play).await;

        // 2s work, 1s break, 2s work, 1s break -> back in work
        sleep(Duration::from_millis(6500)).await;

        let delivered = h.notifier.delivered();
        let phases: Vec<_> = delivered.iter().map(|e| e.ended_phase).collect();
        assert_eq!(
            phases,
            vec![Phase::Work, Phase::Break, Phase::Work, Phase::Break]
        );
        assert_eq!(h.status(1).await.phase, Phase::Work);
        assert_eq!(h.status(1).await.completed_pomodoros, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_completion_never_notifies() {
        let h = create_harness(create_fast_config());
        h.run(1, Command::Play).await;
        sleep(Duration::from_millis(1500)).await;
        h.run(1, Command::Stop).await;

        sleep(Duration::from_secs(10)).await;

        assert_eq!(h.notifier.notification_count(), 0);
        let status = h.status(1).await;
        assert_eq!(status.status, SessionStatus::Idle);
        assert_eq!(status.phase, Phase::Work);
    }

    #[tokio::test(start_paused = true)]
    async fn paused_timer_does_not_complete() {
        let h = create_harness(create_fast_config());
        h.run(1, Command::Play).await;
        sleep(Duration::from_secs(1)).await;
        h.run(1, Command::Pause).await;

        sleep(Duration::from_secs(5)).await;

        let status = h.status(1).await;
        assert_eq!(status.phase, Phase::Work);
        assert_eq!(status.elapsed, Duration::from_secs(1));
        assert_eq!(h.notifier.notification_count(), 0);

        h.run(1, Command::Unpause).await;
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(h.status(1).await.phase, Phase::Break);
        assert_eq!(h.notifier.notification_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_stop_gets_one_notification() {
        let h = create_harness(create_fast_config());
        h.run(1, Command::Play).await;
        sleep(Duration::from_millis(500)).await;
        h.run(1, Command::Stop).await;
        h.run(1, Command::Play).await;

        sleep(Duration::from_millis(2500)).await;

        assert_eq!(h.notifier.notification_count(), 1);
    }
}

// ============================================================================
// Multiple Actors
// ============================================================================

mod multiple_actors {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn actors_advance_independently() {
        let h = create_harness(create_fast_config());
        h.run(1, Command::Play).await;
        sleep(Duration::from_secs(1)).await;
        h.run(2, Command::Play).await;

        sleep(Duration::from_millis(1500)).await;

        assert_eq!(h.status(1).await.phase, Phase::Break);
        assert_eq!(h.status(2).await.phase, Phase::Work);

        let actors: Vec<_> = h.notifier.delivered().iter().map(|e| e.actor_id).collect();
        assert_eq!(actors, vec![ActorId(1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn stopping_one_actor_leaves_others_running() {
        let h = create_harness(create_fast_config());
        h.run(1, Command::Play).await;
        h.run(2, Command::Play).await;
        h.run(1, Command::Stop).await;

        sleep(Duration::from_millis(2500)).await;

        assert_eq!(h.status(1).await.status, SessionStatus::Idle);
        assert_eq!(h.status(2).await.phase, Phase::Break);
        let actors: Vec<_> = h.notifier.delivered().iter().map(|e| e.actor_id).collect();
        assert_eq!(actors, vec![ActorId(2)]);
    }
}

// ============================================================================
// Notification Failures
// ============================================================================

mod notification_failures {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn failed_delivery_does_not_stop_the_timer() {
        let h = create_harness(create_fast_config());
        h.notifier.set_should_fail(true);
        h.run(1, Command::Play).await;

        sleep(Duration::from_secs(5)).await;

        assert_eq!(h.notifier.notification_count(), 0);
        assert!(h.notifier.attempts() > 0);
        assert!(h.status(1).await.completed_pomodoros >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_receiver_does_not_stop_the_timer() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let registry = Arc::new(SessionRegistry::new(create_fast_config(), tx));
        let handler = CommandHandler::new(registry);

        handler.handle(ActorId(1), Command::Play).await;
        sleep(Duration::from_millis(2500)).await;

        let status = handler
            .handle(ActorId(1), Command::Display)
            .await
            .outcome
            .unwrap();
        assert_eq!(status.phase, Phase::Break);
    }
}
