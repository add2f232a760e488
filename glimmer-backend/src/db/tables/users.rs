//! Database operations for the `users` table

use chrono::Utc;
use rusqlite::OptionalExtension;

use crate::db::sqlite::{parse_timestamp, timestamp};
use crate::db::{Database, DbResult};
use crate::models::User;

impl Database {
    /// Upsert a user id and refresh its `last_active`.
    pub fn touch_user(&self, user_id: &str) -> DbResult<()> {
        let conn = self.conn()?;
        let now = timestamp(&Utc::now());
        conn.execute(
            "INSERT INTO users (id, last_active, created_at) VALUES (?1, ?2, ?2)
             ON CONFLICT(id) DO UPDATE SET last_active = excluded.last_active",
            rusqlite::params![user_id, &now],
        )?;
        Ok(())
    }

    /// Make sure a row exists for a user id without touching `last_active`.
    pub fn ensure_user(&self, user_id: &str) -> DbResult<()> {
        let conn = self.conn()?;
        let now = timestamp(&Utc::now());
        conn.execute(
            "INSERT INTO users (id, last_active, created_at) VALUES (?1, ?2, ?2)
             ON CONFLICT(id) DO NOTHING",
            rusqlite::params![user_id, &now],
        )?;
        Ok(())
    }

    pub fn get_user(&self, user_id: &str) -> DbResult<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, display_name, last_active, created_at FROM users WHERE id = ?1",
                [user_id],
                |row| {
                    let last_active: String = row.get(2)?;
                    let created_at: String = row.get(3)?;
                    Ok(User {
                        id: row.get(0)?,
                        display_name: row.get(1)?,
                        last_active: parse_timestamp(2, &last_active)?,
                        created_at: parse_timestamp(3, &created_at)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }
}
