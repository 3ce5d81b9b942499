//! `vitals-scheduler`: turns a reminder snapshot into one-shot alarms.
//!
//! # Overview
//!
//! [`ReminderScheduler::activate`] takes the full current set of a user's
//! reminders, cancels every alarm of the previous activation, and arms one
//! Tokio timer per active reminder. When a timer expires the
//! [`NotificationEmitter`] raises a single alert tagged with the reminder id.
//! Fired alarms are not re-armed; recurrence comes from the host activating
//! again.
//!
//! # Alarm states
//!
//! | State       | Meaning                                              |
//! |-------------|------------------------------------------------------|
//! | `Scheduled` | Timer armed, waiting for the reminder's time of day  |
//! | `Fired`     | Timer expired and the emitter was invoked (terminal) |
//! | `Cancelled` | Torn down by deactivation or re-activation (terminal)|
//!
//! Inactive reminders never get an alarm.

pub mod clock;
pub mod desktop;
pub mod error;
pub mod notify;
pub mod registry;
pub mod schedule;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use desktop::DesktopBackend;
pub use error::{Result, SchedulerError};
pub use notify::{ChannelBackend, NotificationBackend, NotificationEmitter, PermissionState, Readiness};
pub use registry::ReminderScheduler;
pub use schedule::delay_until;
pub use types::{ActivationReport, AlarmInfo, AlarmState};
