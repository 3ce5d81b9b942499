//! `vitals-core`: shared types for the Vitals reminder daemon.
//!
//! Holds the reminder model consumed by the scheduler and the store, the
//! workspace configuration, and the common error type.

pub mod config;
pub mod error;
pub mod reminder;
pub mod types;

pub use error::{CoreError, Result};
pub use reminder::{Notification, Reminder, ReminderCategory, Snapshot, TimeOfDay};
pub use types::UserId;
