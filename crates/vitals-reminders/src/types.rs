use serde::{Deserialize, Serialize};
use vitals_core::reminder::DEFAULT_REMINDER_TIME;
use vitals_core::{Reminder, ReminderCategory, TimeOfDay, UserId};

use crate::error::Result;

/// A validated reminder about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReminder {
    pub category: ReminderCategory,
    pub time: TimeOfDay,
    pub active: bool,
}

impl NewReminder {
    /// Validate raw form input. `time` defaults to [`DEFAULT_REMINDER_TIME`].
    pub fn parse(category: &str, time: Option<&str>, active: bool) -> Result<Self> {
        Ok(Self {
            category: category.parse()?,
            time: time
                .map(str::parse::<TimeOfDay>)
                .transpose()?
                .unwrap_or(DEFAULT_REMINDER_TIME),
            active,
        })
    }
}

impl Default for NewReminder {
    fn default() -> Self {
        Self {
            category: ReminderCategory::Water,
            time: DEFAULT_REMINDER_TIME,
            active: true,
        }
    }
}

/// Partial edit of an existing reminder; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderUpdate {
    pub category: Option<ReminderCategory>,
    pub time: Option<TimeOfDay>,
    pub active: Option<bool>,
}

impl ReminderUpdate {
    /// Validate raw edit-form input.
    pub fn parse(category: Option<&str>, time: Option<&str>, active: Option<bool>) -> Result<Self> {
        Ok(Self {
            category: category.map(str::parse::<ReminderCategory>).transpose()?,
            time: time.map(str::parse::<TimeOfDay>).transpose()?,
            active,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.time.is_none() && self.active.is_none()
    }
}

/// A persisted reminder row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredReminder {
    /// UUID v7 string, primary key.
    pub id: String,
    pub user_id: UserId,
    pub category: ReminderCategory,
    pub time: TimeOfDay,
    pub active: bool,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// RFC 3339 timestamp of the last edit.
    pub updated_at: String,
}

impl StoredReminder {
    /// The scheduler's view of this row.
    pub fn to_reminder(&self) -> Reminder {
        Reminder {
            id: self.id.clone(),
            category: self.category,
            time: self.time,
            active: self.active,
        }
    }
}
