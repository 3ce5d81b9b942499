use thiserror::Error;
use vitals_core::CoreError;

/// Errors that can occur during reminder store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No reminder with this id belongs to the user.
    #[error("reminder not found: {id}")]
    NotFound { id: String },

    /// A SQLite operation failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Form input failed validation (unknown category, malformed time).
    #[error("invalid reminder: {0}")]
    Invalid(#[from] CoreError),

    /// An update carried no fields to change.
    #[error("nothing to update")]
    EmptyUpdate,
}

pub type Result<T> = std::result::Result<T, StoreError>;
