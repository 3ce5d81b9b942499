use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use vitals_core::{Snapshot, UserId};

use crate::db::init_db;
use crate::error::{Result, StoreError};
use crate::types::{NewReminder, ReminderUpdate, StoredReminder};

const COLUMNS: &str = "id, user_id, category, time, active, created_at, updated_at";

/// Raw column values, decoded into a [`StoredReminder`] after the query.
type RawRow = (String, String, String, String, bool, String, String);

/// Thread-safe store for a user's reminders.
///
/// Every operation is scoped by `user_id`: a reminder owned by another user is
/// reported as not found.
pub struct ReminderStore {
    db: Mutex<Connection>,
}

impl ReminderStore {
    /// Wrap an open connection, creating the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    /// Insert a validated reminder and return the stored row.
    #[instrument(skip(self, new), fields(user_id = %user_id))]
    pub fn create(&self, user_id: &UserId, new: NewReminder) -> Result<StoredReminder> {
        let id = Uuid::now_v7().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        let db = self.lock();
        db.execute(
            "INSERT INTO reminders
             (id, user_id, category, time, active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            rusqlite::params![
                id,
                user_id.as_str(),
                new.category.as_str(),
                new.time.to_string(),
                new.active,
                now
            ],
        )?;
        info!(reminder_id = %id, category = %new.category, time = %new.time, "reminder created");

        Ok(StoredReminder {
            id,
            user_id: user_id.clone(),
            category: new.category,
            time: new.time,
            active: new.active,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Retrieve one reminder, returning `None` if the user has no such id.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub fn get(&self, user_id: &UserId, id: &str) -> Result<Option<StoredReminder>> {
        let db = self.lock();
        Self::fetch(&db, user_id, id)
    }

    /// All of the user's reminders ordered by time of day.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub fn list(&self, user_id: &UserId) -> Result<Vec<StoredReminder>> {
        self.query_user(user_id, false)
    }

    /// Only the user's active reminders, ordered by time of day.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub fn list_active(&self, user_id: &UserId) -> Result<Vec<StoredReminder>> {
        self.query_user(user_id, true)
    }

    /// Apply a partial edit. Fails with `EmptyUpdate` if nothing would change.
    #[instrument(skip(self, update), fields(user_id = %user_id))]
    pub fn update(
        &self,
        user_id: &UserId,
        id: &str,
        update: ReminderUpdate,
    ) -> Result<StoredReminder> {
        if update.is_empty() {
            return Err(StoreError::EmptyUpdate);
        }

        let db = self.lock();
        let mut reminder = Self::fetch(&db, user_id, id)?.ok_or_else(|| StoreError::NotFound {
            id: id.to_string(),
        })?;

        if let Some(category) = update.category {
            reminder.category = category;
        }
        if let Some(time) = update.time {
            reminder.time = time;
        }
        if let Some(active) = update.active {
            reminder.active = active;
        }
        reminder.updated_at = chrono::Utc::now().to_rfc3339();

        db.execute(
            "UPDATE reminders
             SET category = ?1, time = ?2, active = ?3, updated_at = ?4
             WHERE id = ?5 AND user_id = ?6",
            rusqlite::params![
                reminder.category.as_str(),
                reminder.time.to_string(),
                reminder.active,
                reminder.updated_at,
                id,
                user_id.as_str()
            ],
        )?;
        info!(reminder_id = %id, "reminder updated");
        Ok(reminder)
    }

    /// Flip the active flag only.
    pub fn set_active(&self, user_id: &UserId, id: &str, active: bool) -> Result<StoredReminder> {
        self.update(
            user_id,
            id,
            ReminderUpdate {
                active: Some(active),
                ..ReminderUpdate::default()
            },
        )
    }

    /// Permanently delete a reminder.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub fn delete(&self, user_id: &UserId, id: &str) -> Result<()> {
        let db = self.lock();
        let rows_changed = db.execute(
            "DELETE FROM reminders WHERE id = ?1 AND user_id = ?2",
            rusqlite::params![id, user_id.as_str()],
        )?;
        if rows_changed == 0 {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        info!(reminder_id = %id, "reminder deleted");
        Ok(())
    }

    /// The user's full reminder set, active and inactive, for the scheduler.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub fn snapshot(&self, user_id: &UserId) -> Result<Snapshot> {
        let snapshot: Snapshot = self
            .list(user_id)?
            .iter()
            .map(StoredReminder::to_reminder)
            .collect();
        debug!(count = snapshot.len(), "snapshot loaded");
        Ok(snapshot)
    }

    // --- private helpers ---------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fetch(db: &Connection, user_id: &UserId, id: &str) -> Result<Option<StoredReminder>> {
        let raw = db
            .query_row(
                &format!("SELECT {COLUMNS} FROM reminders WHERE id = ?1 AND user_id = ?2"),
                rusqlite::params![id, user_id.as_str()],
                read_row,
            )
            .optional()?;
        Ok(raw.and_then(decode_row))
    }

    fn query_user(&self, user_id: &UserId, active_only: bool) -> Result<Vec<StoredReminder>> {
        let db = self.lock();
        let sql = if active_only {
            format!(
                "SELECT {COLUMNS} FROM reminders
                 WHERE user_id = ?1 AND active = 1
                 ORDER BY time, created_at"
            )
        } else {
            format!(
                "SELECT {COLUMNS} FROM reminders
                 WHERE user_id = ?1
                 ORDER BY time, created_at"
            )
        };
        let mut stmt = db.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params![user_id.as_str()], read_row)?;
        Ok(rows
            .filter_map(|r| match r {
                Ok(raw) => Some(raw),
                Err(e) => {
                    warn!(user_id = %user_id, "skipping unreadable reminder row: {e}");
                    None
                }
            })
            .filter_map(decode_row)
            .collect())
    }
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?, // id
        row.get(1)?, // user_id
        row.get(2)?, // category
        row.get(3)?, // time
        row.get(4)?, // active
        row.get(5)?, // created_at
        row.get(6)?, // updated_at
    ))
}

/// Rows with an unknown category or malformed time are skipped, not fatal.
fn decode_row(raw: RawRow) -> Option<StoredReminder> {
    let (id, user_id, category, time, active, created_at, updated_at) = raw;
    let category = match category.parse() {
        Ok(c) => c,
        Err(e) => {
            warn!(reminder_id = %id, "skipping reminder row: {e}");
            return None;
        }
    };
    let time = match time.parse() {
        Ok(t) => t,
        Err(e) => {
            warn!(reminder_id = %id, "skipping reminder row: {e}");
            return None;
        }
    };
    Some(StoredReminder {
        id,
        user_id: UserId(user_id),
        category,
        time,
        active,
        created_at,
        updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitals_core::ReminderCategory;

    fn store() -> ReminderStore {
        ReminderStore::new(Connection::open_in_memory().unwrap()).unwrap()
    }

    fn new(category: &str, time: &str, active: bool) -> NewReminder {
        NewReminder::parse(category, Some(time), active).unwrap()
    }

    #[test]
    fn create_then_get() {
        let store = store();
        let user = UserId::from("u1");
        let created = store.create(&user, new("water", "08:00", true)).unwrap();

        let fetched = store.get(&user, &created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.time.to_string(), "08:00");
    }

    #[test]
    fn list_is_ordered_by_time() {
        let store = store();
        let user = UserId::from("u1");
        store.create(&user, new("other", "21:00", true)).unwrap();
        store.create(&user, new("water", "07:30", true)).unwrap();
        store.create(&user, new("medication", "12:00", false)).unwrap();

        let times: Vec<String> = store
            .list(&user)
            .unwrap()
            .iter()
            .map(|r| r.time.to_string())
            .collect();
        assert_eq!(times, vec!["07:30", "12:00", "21:00"]);

        let active = store.list_active(&user).unwrap();
        assert_eq!(active.len(), 2);
        assert!(active.iter().all(|r| r.active));
    }

    #[test]
    fn operations_are_scoped_to_owner() {
        let store = store();
        let alice = UserId::from("alice");
        let bob = UserId::from("bob");
        let r = store.create(&alice, new("water", "08:00", true)).unwrap();

        assert!(store.get(&bob, &r.id).unwrap().is_none());
        assert!(store.list(&bob).unwrap().is_empty());
        assert!(matches!(
            store.delete(&bob, &r.id),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.set_active(&bob, &r.id, false),
            Err(StoreError::NotFound { .. })
        ));
        assert!(store.get(&alice, &r.id).unwrap().is_some());
    }

    #[test]
    fn update_changes_only_given_fields() {
        let store = store();
        let user = UserId::from("u1");
        let r = store.create(&user, new("water", "08:00", true)).unwrap();

        let updated = store
            .update(
                &user,
                &r.id,
                ReminderUpdate::parse(Some("remedio"), None, None).unwrap(),
            )
            .unwrap();
        assert_eq!(updated.category, ReminderCategory::Medication);
        assert_eq!(updated.time, r.time);
        assert!(updated.active);
        assert_eq!(store.get(&user, &r.id).unwrap().unwrap(), updated);
    }

    #[test]
    fn empty_update_is_rejected() {
        let store = store();
        let user = UserId::from("u1");
        let r = store.create(&user, new("water", "08:00", true)).unwrap();
        assert!(matches!(
            store.update(&user, &r.id, ReminderUpdate::default()),
            Err(StoreError::EmptyUpdate)
        ));
    }

    #[test]
    fn delete_removes_row() {
        let store = store();
        let user = UserId::from("u1");
        let r = store.create(&user, new("water", "08:00", true)).unwrap();
        store.delete(&user, &r.id).unwrap();
        assert!(store.get(&user, &r.id).unwrap().is_none());
        assert!(matches!(
            store.delete(&user, &r.id),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn snapshot_carries_active_flags() {
        let store = store();
        let user = UserId::from("u1");
        let on = store.create(&user, new("water", "08:00", true)).unwrap();
        let off = store.create(&user, new("other", "09:00", true)).unwrap();
        store.set_active(&user, &off.id, false).unwrap();

        let snapshot = store.snapshot(&user).unwrap();
        assert_eq!(snapshot.len(), 2);
        let active: Vec<_> = snapshot.active().map(|r| r.id.clone()).collect();
        assert_eq!(active, vec![on.id]);
    }

    #[test]
    fn corrupt_rows_are_skipped() {
        let store = store();
        let user = UserId::from("u1");
        store.create(&user, new("water", "08:00", true)).unwrap();
        store
            .lock()
            .execute(
                "INSERT INTO reminders VALUES ('bad', 'u1', 'water', '25:99', 1, 'x', 'x')",
                [],
            )
            .unwrap();

        let listed = store.list(&user).unwrap();
        assert_eq!(listed.len(), 1);
        assert!(store.get(&user, "bad").unwrap().is_none());
    }

    #[test]
    fn unreadable_rows_are_skipped() {
        let store = store();
        let user = UserId::from("u1");
        store.create(&user, new("water", "08:00", true)).unwrap();
        store
            .lock()
            .execute(
                "INSERT INTO reminders VALUES ('odd', 'u1', 'water', '09:00', 'yes', 'x', 'x')",
                [],
            )
            .unwrap();

        let listed = store.list(&user).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].time.to_string(), "08:00");
        assert_eq!(store.snapshot(&user).unwrap().len(), 1);
    }

    #[test]
    fn accepts_legacy_portuguese_categories() {
        let store = store();
        store
            .lock()
            .execute(
                "INSERT INTO reminders VALUES ('old', 'u1', 'agua', '08:00:00', 1, 'x', 'x')",
                [],
            )
            .unwrap();
        let r = store.get(&UserId::from("u1"), "old").unwrap().unwrap();
        assert_eq!(r.category, ReminderCategory::Water);
        assert_eq!(r.time.to_string(), "08:00");
    }
}
