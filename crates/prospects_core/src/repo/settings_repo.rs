//! Key-value settings persistence.
//!
//! # Responsibility
//! - Store small scalar settings (self profile name/email) by key.
//!
//! # Invariants
//! - Keys are unique; writes replace the previous value.
//! - Missing keys read as `None`; defaults belong to callers.

use crate::db::SharedConnection;
use crate::repo::contact_repo::{RepoError, RepoResult};
use crate::repo::lock_conn;
use rusqlite::{params, OptionalExtension};

/// Repository interface for scalar settings.
pub trait SettingsRepository: Send + Sync {
    fn get_setting(&self, key: &str) -> RepoResult<Option<String>>;
    fn set_setting(&self, key: &str, value: &str) -> RepoResult<()>;
    fn remove_setting(&self, key: &str) -> RepoResult<()>;
}

/// SQLite-backed settings repository over the `settings` table.
pub struct SqliteSettingsRepository {
    conn: SharedConnection,
}

impl SqliteSettingsRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

impl SettingsRepository for SqliteSettingsRepository {
    fn get_setting(&self, key: &str) -> RepoResult<Option<String>> {
        let conn = lock_conn(&self.conn)?;
        let value = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_setting(&self, key: &str, value: &str) -> RepoResult<()> {
        if key.trim().is_empty() {
            return Err(RepoError::InvalidData(
                "setting key must not be empty".to_string(),
            ));
        }

        let conn = lock_conn(&self.conn)?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove_setting(&self, key: &str) -> RepoResult<()> {
        let conn = lock_conn(&self.conn)?;
        conn.execute("DELETE FROM settings WHERE key = ?1;", [key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{SettingsRepository, SqliteSettingsRepository};
    use crate::db::open_shared_in_memory;

    #[test]
    fn set_replaces_previous_value_and_remove_clears_it() {
        let repo = SqliteSettingsRepository::new(open_shared_in_memory().unwrap());

        assert_eq!(repo.get_setting("name").unwrap(), None);
        repo.set_setting("name", "Ada").unwrap();
        repo.set_setting("name", "Grace").unwrap();
        assert_eq!(repo.get_setting("name").unwrap().as_deref(), Some("Grace"));

        repo.remove_setting("name").unwrap();
        assert_eq!(repo.get_setting("name").unwrap(), None);
    }

    #[test]
    fn empty_key_is_rejected() {
        let repo = SqliteSettingsRepository::new(open_shared_in_memory().unwrap());
        assert!(repo.set_setting("  ", "value").is_err());
    }
}
