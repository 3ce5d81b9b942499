use thiserror::Error;

/// Errors raised while delivering a notification.
///
/// None of these cross the scheduler boundary: the emitter logs them and the
/// alarm stays `Fired`.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The notifier executable could not be located on PATH.
    #[error("Notifier command not found: {command}")]
    CommandNotFound { command: String },

    /// Spawning the notifier process failed.
    #[error("Failed to spawn notifier: {0}")]
    Spawn(#[from] std::io::Error),

    /// Delivery needs a Tokio runtime and none is running on this thread.
    #[error("No Tokio runtime available for notification delivery")]
    NoRuntime,

    /// The receiving side of a notification channel is gone.
    #[error("Notification channel closed")]
    ChannelClosed,

    /// The notification channel is at capacity.
    #[error("Notification channel full")]
    ChannelFull,
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
