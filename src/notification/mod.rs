//! Phase-end notification delivery.
//!
//! Completion watchers push a [`PhaseEvent`] onto an unbounded channel; a
//! single dispatcher task drains it and hands each event to a
//! [`NotificationSender`]. Senders render the event with
//! [`render_phase_message`] and deliver it to their sink.
//!
//! # Example
//!
//! ```rust,ignore
//! use pomobot::notification::{dispatch_notifications, ConsoleNotificationSender};
//!
//! let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
//! tokio::spawn(dispatch_notifications(rx, ConsoleNotificationSender::new()));
//! ```

mod content;
pub mod error;

use std::future::Future;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;

use crate::daemon::PhaseEvent;

pub use self::content::render_phase_message;
pub use self::error::NotificationError;

/// Maximum retry attempts for a failed delivery.
const MAX_RETRIES: u32 = 3;

/// Delay between retry attempts in milliseconds.
const RETRY_DELAY_MS: u64 = 500;

// ============================================================================
// NotificationSender
// ============================================================================

/// Delivers phase-end notices to a sink.
pub trait NotificationSender {
    /// Delivers the notice for one completed phase.
    fn send_phase_complete(
        &self,
        event: &PhaseEvent,
    ) -> impl Future<Output = Result<(), NotificationError>> + Send;

    /// Returns false if the sink cannot currently accept notices.
    fn is_available(&self) -> bool;
}

impl<T> NotificationSender for Arc<T>
where
    T: NotificationSender + Send + Sync,
{
    fn send_phase_complete(
        &self,
        event: &PhaseEvent,
    ) -> impl Future<Output = Result<(), NotificationError>> + Send {
        (**self).send_phase_complete(event)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

/// Writes each notice as a line on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotificationSender;

impl ConsoleNotificationSender {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl NotificationSender for ConsoleNotificationSender {
    async fn send_phase_complete(&self, event: &PhaseEvent) -> Result<(), NotificationError> {
        let line = render_phase_message(event);
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{line}")?;
        stdout.flush()?;
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Records each notice in the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationSender;

impl LogNotificationSender {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl NotificationSender for LogNotificationSender {
    async fn send_phase_complete(&self, event: &PhaseEvent) -> Result<(), NotificationError> {
        tracing::info!(
            actor = %event.actor_id,
            id = %event.id,
            "{}",
            render_phase_message(event)
        );
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// In-memory sender for tests. Records delivered events and can be told to
/// fail.
#[derive(Debug)]
pub struct MockNotificationSender {
    delivered: Mutex<Vec<PhaseEvent>>,
    attempts: AtomicUsize,
    available: AtomicBool,
    should_fail: AtomicBool,
}

impl Default for MockNotificationSender {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNotificationSender {
    #[must_use]
    pub fn new() -> Self {
        Self {
            delivered: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            available: AtomicBool::new(true),
            should_fail: AtomicBool::new(false),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Events delivered so far, in order.
    #[must_use]
    pub fn delivered(&self) -> Vec<PhaseEvent> {
        self.delivered.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Rendered text of every delivered event.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.delivered().iter().map(render_phase_message).collect()
    }

    #[must_use]
    pub fn notification_count(&self) -> usize {
        self.delivered.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of delivery attempts, failed ones included.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl NotificationSender for MockNotificationSender {
    async fn send_phase_complete(&self, event: &PhaseEvent) -> Result<(), NotificationError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(NotificationError::SendFailed("Mock failure".to_string()));
        }
        self.delivered.lock().unwrap_or_else(PoisonError::into_inner).push(event.clone());
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Drains `events` until every sender is dropped, delivering each event.
///
/// Failed deliveries are retried a few times, then logged and skipped. A
/// closed sink ends the dispatcher.
pub async fn dispatch_notifications<S>(mut events: mpsc::UnboundedReceiver<PhaseEvent>, sender: S)
where
    S: NotificationSender,
{
    while let Some(event) = events.recv().await {
        if !sender.is_available() {
            tracing::warn!(actor = %event.actor_id, "notification sink unavailable, notice dropped");
            continue;
        }

        match send_with_retry(&sender, &event).await {
            Ok(()) => tracing::debug!(actor = %event.actor_id, id = %event.id, "notice delivered"),
            Err(NotificationError::ChannelClosed) => {
                tracing::warn!("notification sink closed, stopping dispatcher");
                return;
            }
            Err(e) => tracing::warn!(actor = %event.actor_id, "notice dropped: {e}"),
        }
    }
    tracing::debug!("notification channel closed");
}

async fn send_with_retry<S>(sender: &S, event: &PhaseEvent) -> Result<(), NotificationError>
where
    S: NotificationSender,
{
    let mut retries = 0;
    loop {
        match sender.send_phase_complete(event).await {
            Ok(()) => return Ok(()),
            Err(e) if e.is_retryable() && retries < MAX_RETRIES => {
                retries += 1;
                tracing::warn!("notification failed (retry {retries}/{MAX_RETRIES}): {e}");
                tokio::time::sleep(tokio::time::Duration::from_millis(RETRY_DELAY_MS)).await;
            }
            Err(e) => return Err(e),
        }
    }
}
