use std::time::Duration;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use vitals_core::ReminderCategory;

use crate::notify::Readiness;

/// Lifecycle state of a single alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmState {
    /// Timer armed, waiting for expiry.
    Scheduled,
    /// Timer expired and the emitter was invoked. Never re-armed.
    Fired,
    /// Torn down before expiry.
    Cancelled,
}

impl std::fmt::Display for AlarmState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AlarmState::Scheduled => "scheduled",
            AlarmState::Fired => "fired",
            AlarmState::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Read-only view of one alarm in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmInfo {
    pub reminder_id: String,
    pub category: ReminderCategory,
    /// Delay computed when the alarm was armed.
    pub delay: Duration,
    /// Local wall-clock instant the alarm targets.
    pub fires_at: NaiveDateTime,
    pub state: AlarmState,
}

/// Outcome of one activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationReport {
    /// Alarms of the previous activation that were still pending and got cancelled.
    pub cancelled: usize,
    /// Alarms armed for this snapshot.
    pub armed: usize,
    /// Reminders skipped because their active flag is off.
    pub skipped_inactive: usize,
    /// Whether fired alarms will actually reach the user.
    pub readiness: Readiness,
}
