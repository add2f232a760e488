//! Activity feed database operations

use chrono::Utc;
use serde_json::Value;
use std::str::FromStr;
use uuid::Uuid;

use crate::db::sqlite::{parse_timestamp, timestamp};
use crate::db::{Database, DbResult};
use crate::models::{Activity, ActivityType};

impl Database {
    pub fn insert_activity(
        &self,
        user_id: &str,
        activity_type: ActivityType,
        description: &str,
        data: Value,
    ) -> DbResult<Activity> {
        let activity = Activity {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            activity_type,
            description: description.to_string(),
            data,
            created_at: Utc::now(),
        };

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO activities (id, user_id, activity_type, description, data, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                &activity.id,
                &activity.user_id,
                activity.activity_type.as_ref(),
                &activity.description,
                serde_json::to_string(&activity.data)?,
                timestamp(&activity.created_at),
            ],
        )?;

        Ok(activity)
    }

    /// Newest activities for a user.
    pub fn list_activities(&self, user_id: &str, limit: u32) -> DbResult<Vec<Activity>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, activity_type, description, data, created_at
             FROM activities WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2",
        )?;

        let activities = stmt
            .query_map(rusqlite::params![user_id, limit], |row| {
                let activity_type: String = row.get(2)?;
                let data: Option<String> = row.get(4)?;
                let created_at: String = row.get(5)?;
                let activity_type = ActivityType::from_str(&activity_type).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
                })?;
                Ok(Activity {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    activity_type,
                    description: row.get(3)?,
                    data: data
                        .and_then(|d| serde_json::from_str(&d).ok())
                        .unwrap_or(Value::Null),
                    created_at: parse_timestamp(5, &created_at)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(activities)
    }
}
