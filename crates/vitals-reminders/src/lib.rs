//! `vitals-reminders`: SQLite-backed reminder records, scoped per user.
//!
//! Stands in for the hosted data service of the original app: reminders are
//! created, edited, toggled and deleted here, and the scheduler reads them
//! back as a [`Snapshot`](vitals_core::Snapshot).

pub mod db;
pub mod error;
pub mod manager;
pub mod types;

pub use error::{Result, StoreError};
pub use manager::ReminderStore;
pub use types::{NewReminder, ReminderUpdate, StoredReminder};
