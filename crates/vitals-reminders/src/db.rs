use rusqlite::Connection;

use crate::error::Result;

/// Initialise the reminders table and its index.
///
/// Safe to call on every startup; uses `IF NOT EXISTS` throughout.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS reminders (
            id          TEXT    NOT NULL PRIMARY KEY,
            user_id     TEXT    NOT NULL,
            category    TEXT    NOT NULL,   -- water | medication | other
            time        TEXT    NOT NULL,   -- HH:MM, local clock
            active      INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT    NOT NULL,
            updated_at  TEXT    NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_reminders_user_time
            ON reminders(user_id, time);",
    )?;
    Ok(())
}
