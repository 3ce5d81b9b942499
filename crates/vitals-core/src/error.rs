use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A time-of-day string that is not a valid 24-hour `HH:MM` value.
    #[error("Invalid time of day: {0:?} (expected HH:MM, 00:00-23:59)")]
    InvalidTime(String),

    #[error("Unknown reminder category: {0:?}")]
    UnknownCategory(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
