use std::sync::Arc;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use super::domain::setting_keys;
use crate::storage::{Database, StorageError};

/// Global key/value settings shared by every screen.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    db: Arc<Database>,
}

impl SettingsStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.db.with_conn(|conn| read_setting(conn, key))
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
            Ok(())
        })
    }

    pub fn remove(&self, key: &str) -> Result<bool, StorageError> {
        self.db.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM settings WHERE key = ?1", [key])?;
            Ok(removed > 0)
        })
    }

    /// The configured course drop deadline, if any parses.
    pub fn course_drop_deadline(&self) -> Result<Option<NaiveDate>, StorageError> {
        self.db.with_conn(|conn| course_drop_deadline(conn))
    }

    pub fn set_course_drop_deadline(&self, deadline: NaiveDate) -> Result<(), StorageError> {
        self.set(
            setting_keys::COURSE_DROP_DEADLINE,
            &deadline.format("%Y-%m-%d").to_string(),
        )
    }
}

pub(crate) fn read_setting(conn: &Connection, key: &str) -> Result<Option<String>, StorageError> {
    Ok(conn
        .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
            row.get::<_, String>(0)
        })
        .optional()?)
}

/// A missing or unparseable value means there is no deadline.
pub(crate) fn course_drop_deadline(conn: &Connection) -> Result<Option<NaiveDate>, StorageError> {
    let raw = read_setting(conn, setting_keys::COURSE_DROP_DEADLINE)?;
    Ok(raw.and_then(|value| parse_deadline(&value)))
}

fn parse_deadline(value: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(err) => {
            tracing::warn!(value, %err, "ignoring unparseable course drop deadline");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SettingsStore {
        SettingsStore::new(Arc::new(Database::open_in_memory().expect("database")))
    }

    #[test]
    fn set_overwrites_existing_values() {
        let settings = store();
        settings.set("MAINTENANCE_NOTE", "first").expect("set");
        settings.set("MAINTENANCE_NOTE", "second").expect("overwrite");
        assert_eq!(
            settings.get("MAINTENANCE_NOTE").expect("get").as_deref(),
            Some("second")
        );
        assert!(settings.remove("MAINTENANCE_NOTE").expect("remove"));
        assert!(!settings.remove("MAINTENANCE_NOTE").expect("remove again"));
    }

    #[test]
    fn drop_deadline_round_trips_and_tolerates_garbage() {
        let settings = store();
        assert_eq!(settings.course_drop_deadline().expect("read"), None);

        let deadline = NaiveDate::from_ymd_opt(2025, 12, 5).expect("valid");
        settings.set_course_drop_deadline(deadline).expect("set");
        assert_eq!(
            settings.course_drop_deadline().expect("read"),
            Some(deadline)
        );

        settings
            .set(setting_keys::COURSE_DROP_DEADLINE, "next friday")
            .expect("set garbage");
        assert_eq!(settings.course_drop_deadline().expect("read"), None);
    }
}
