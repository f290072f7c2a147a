//! Notification delivery error types.

use thiserror::Error;

/// Errors that can occur while delivering a phase-end notice.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The sink rejected the notice.
    #[error("failed to send notification: {0}")]
    SendFailed(String),

    /// The sink is gone; no later notice can be delivered either.
    #[error("notification channel closed")]
    ChannelClosed,
}

impl NotificationError {
    /// Returns true if another attempt may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SendFailed(_))
    }
}

impl From<std::io::Error> for NotificationError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::BrokenPipe => Self::ChannelClosed,
            _ => Self::SendFailed(e.to_string()),
        }
    }
}
