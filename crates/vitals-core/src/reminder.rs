//! Reminder model shared between the store, the scheduler and the daemon.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Title carried by every reminder notification.
pub const NOTIFICATION_TITLE: &str = "Lembrete";

/// Closed set of reminder kinds a user can pick from.
///
/// Serialised in English; the Portuguese values written by the original web
/// client (`agua`, `remedio`, `outro`) are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderCategory {
    #[serde(alias = "agua", alias = "água")]
    Water,
    #[serde(alias = "remedio", alias = "remédio")]
    Medication,
    #[serde(alias = "outro")]
    Other,
}

impl ReminderCategory {
    /// Stable storage value.
    pub fn as_str(self) -> &'static str {
        match self {
            ReminderCategory::Water => "water",
            ReminderCategory::Medication => "medication",
            ReminderCategory::Other => "other",
        }
    }

    /// Word used inside notification bodies.
    pub fn label(self) -> &'static str {
        match self {
            ReminderCategory::Water => "água",
            ReminderCategory::Medication => "remédio",
            ReminderCategory::Other => "outro",
        }
    }

    /// Decorated name for listings.
    pub fn display_name(self) -> &'static str {
        match self {
            ReminderCategory::Water => "💧 Água",
            ReminderCategory::Medication => "💊 Remédio",
            ReminderCategory::Other => "🔔 Outro",
        }
    }

    pub fn notification_body(self) -> String {
        format!("Hora de: {}", self.label())
    }
}

impl fmt::Display for ReminderCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReminderCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "water" | "agua" | "água" => Ok(ReminderCategory::Water),
            "medication" | "remedio" | "remédio" => Ok(ReminderCategory::Medication),
            "other" | "outro" => Ok(ReminderCategory::Other),
            _ => Err(CoreError::UnknownCategory(s.to_string())),
        }
    }
}

/// A wall-clock time of day on the local 24-hour clock, without a date.
///
/// Construction is strict: hours outside 0–23 or minutes outside 0–59 are
/// rejected, so every value reaching the scheduler is a real local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

/// Time a freshly created reminder starts with.
pub const DEFAULT_REMINDER_TIME: TimeOfDay = TimeOfDay { hour: 8, minute: 0 };

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self, CoreError> {
        if hour > 23 || minute > 59 {
            return Err(CoreError::InvalidTime(format!("{hour}:{minute}")));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = CoreError;

    /// Parses `HH:MM`; the hour may be written with one digit. A trailing `:SS` (as returned by SQL `time` columns)
    /// is accepted and ignored; alarms always fire on the minute.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidTime(s.to_string());
        let mut parts = s.trim().split(':');

        let mut field = |min_len: usize, max: u8| -> Result<u8, CoreError> {
            let raw = parts.next().ok_or_else(invalid)?;
            if raw.len() < min_len || raw.len() > 2 || !raw.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            let value: u8 = raw.parse().map_err(|_| invalid())?;
            if value > max {
                return Err(invalid());
            }
            Ok(value)
        };

        let hour = field(1, 23)?;
        let minute = field(2, 59)?;
        if let Some(seconds) = parts.next() {
            let valid = seconds.len() == 2
                && seconds.bytes().all(|b| b.is_ascii_digit())
                && seconds.parse::<u8>().is_ok_and(|v| v <= 59);
            if !valid {
                return Err(invalid());
            }
        }
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self { hour, minute })
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// A recurring daily reminder as seen by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub category: ReminderCategory,
    pub time: TimeOfDay,
    pub active: bool,
}

/// Body of a snapshot entry; the id is the map key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderEntry {
    pub category: ReminderCategory,
    pub time: TimeOfDay,
    pub active: bool,
}

/// The full set of a user's reminders at one point in time.
///
/// Keyed by reminder id, so a snapshot can never hold two reminders with the
/// same identity. Serialises as `{"<id>": {"category", "time", "active"}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, ReminderEntry>",
    into = "BTreeMap<String, ReminderEntry>"
)]
pub struct Snapshot {
    reminders: BTreeMap<String, Reminder>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a reminder, returning the previous one with that id.
    pub fn insert(&mut self, reminder: Reminder) -> Option<Reminder> {
        self.reminders.insert(reminder.id.clone(), reminder)
    }

    pub fn get(&self, id: &str) -> Option<&Reminder> {
        self.reminders.get(id)
    }

    pub fn len(&self) -> usize {
        self.reminders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty()
    }

    /// All reminders, ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &Reminder> {
        self.reminders.values()
    }

    /// Reminders whose active flag is set.
    pub fn active(&self) -> impl Iterator<Item = &Reminder> {
        self.reminders.values().filter(|r| r.active)
    }
}

impl FromIterator<Reminder> for Snapshot {
    fn from_iter<I: IntoIterator<Item = Reminder>>(iter: I) -> Self {
        let mut snapshot = Snapshot::new();
        for reminder in iter {
            snapshot.insert(reminder);
        }
        snapshot
    }
}

impl From<BTreeMap<String, ReminderEntry>> for Snapshot {
    fn from(map: BTreeMap<String, ReminderEntry>) -> Self {
        map.into_iter()
            .map(|(id, e)| Reminder {
                id,
                category: e.category,
                time: e.time,
                active: e.active,
            })
            .collect()
    }
}

impl From<Snapshot> for BTreeMap<String, ReminderEntry> {
    fn from(snapshot: Snapshot) -> Self {
        snapshot
            .reminders
            .into_iter()
            .map(|(id, r)| {
                (
                    id,
                    ReminderEntry {
                        category: r.category,
                        time: r.time,
                        active: r.active,
                    },
                )
            })
            .collect()
    }
}

/// A single user-visible alert.
///
/// `tag` is the reminder id; platforms that deduplicate by tag collapse
/// repeated alerts for the same reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub tag: String,
}

impl Notification {
    pub fn for_reminder(category: ReminderCategory, reminder_id: &str) -> Self {
        Self {
            title: NOTIFICATION_TITLE.to_string(),
            body: category.notification_body(),
            tag: reminder_id.to_string(),
        }
    }
}
