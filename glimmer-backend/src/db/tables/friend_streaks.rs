//! Friendship streak database operations

use chrono::{DateTime, Duration, Utc};
use rusqlite::{OptionalExtension, TransactionBehavior};

use crate::db::sqlite::{parse_timestamp, timestamp};
use crate::db::{Database, DbResult};
use crate::models::FriendStreak;

/// Streak count after an interaction at `now`.
///
/// `previous` is the stored (count, last interaction). A first interaction or
/// one after more than `window` of silence starts over at 1; another
/// interaction on the same UTC day keeps the count; anything else extends it.
pub fn next_streak(previous: Option<(i64, DateTime<Utc>)>, now: DateTime<Utc>, window: Duration) -> i64 {
    match previous {
        None => 1,
        Some((_, last)) if now - last > window => 1,
        Some((count, last)) if last.date_naive() == now.date_naive() => count.max(1),
        Some((count, _)) => count + 1,
    }
}

impl Database {
    /// Record an interaction between two users and return the updated streak.
    pub fn record_interaction(
        &self,
        user_1: &str,
        user_2: &str,
        now: DateTime<Utc>,
        window_hours: i64,
    ) -> DbResult<FriendStreak> {
        let (user_a, user_b) = FriendStreak::key(user_1, user_2);
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let previous = tx
            .query_row(
                "SELECT streak_count, longest_streak, last_interaction
                 FROM friend_streaks WHERE user_a = ?1 AND user_b = ?2",
                [&user_a, &user_b],
                |row| {
                    let last: String = row.get(2)?;
                    Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, parse_timestamp(2, &last)?))
                },
            )
            .optional()?;

        let streak_count = next_streak(
            previous.map(|(count, _, last)| (count, last)),
            now,
            Duration::hours(window_hours),
        );
        let longest_streak = previous.map_or(0, |(_, longest, _)| longest).max(streak_count);

        tx.execute(
            "INSERT INTO friend_streaks (user_a, user_b, streak_count, longest_streak, last_interaction)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_a, user_b) DO UPDATE SET
                streak_count = excluded.streak_count,
                longest_streak = excluded.longest_streak,
                last_interaction = excluded.last_interaction",
            rusqlite::params![&user_a, &user_b, streak_count, longest_streak, timestamp(&now)],
        )?;
        tx.commit()?;

        Ok(FriendStreak {
            user_a,
            user_b,
            streak_count,
            longest_streak,
            last_interaction: now,
        })
    }

    pub fn get_streak(&self, user_1: &str, user_2: &str) -> DbResult<Option<FriendStreak>> {
        let (user_a, user_b) = FriendStreak::key(user_1, user_2);
        let conn = self.conn()?;
        let streak = conn
            .query_row(
                "SELECT user_a, user_b, streak_count, longest_streak, last_interaction
                 FROM friend_streaks WHERE user_a = ?1 AND user_b = ?2",
                [&user_a, &user_b],
                |row| {
                    let last: String = row.get(4)?;
                    Ok(FriendStreak {
                        user_a: row.get(0)?,
                        user_b: row.get(1)?,
                        streak_count: row.get(2)?,
                        longest_streak: row.get(3)?,
                        last_interaction: parse_timestamp(4, &last)?,
                    })
                },
            )
            .optional()?;
        Ok(streak)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_next_streak_rules() {
        let window = Duration::hours(48);
        assert_eq!(next_streak(None, at(1, 10), window), 1);
        // same day: unchanged
        assert_eq!(next_streak(Some((3, at(1, 1))), at(1, 23), window), 3);
        // next day: extended
        assert_eq!(next_streak(Some((3, at(1, 23))), at(2, 1), window), 4);
        // within the window but two days later still extends
        assert_eq!(next_streak(Some((3, at(1, 12))), at(3, 11), window), 4);
        // past the window: reset
        assert_eq!(next_streak(Some((9, at(1, 12))), at(3, 13), window), 1);
    }

    #[test]
    fn test_record_interaction_tracks_longest() {
        let db = Database::new(":memory:").unwrap();
        db.touch_user("ana").unwrap();
        db.touch_user("ben").unwrap();

        assert!(db.get_streak("ana", "ben").unwrap().is_none());
        db.record_interaction("ben", "ana", at(1, 9), 48).unwrap();
        db.record_interaction("ana", "ben", at(2, 9), 48).unwrap();
        let streak = db.record_interaction("ana", "ben", at(3, 9), 48).unwrap();
        assert_eq!(streak.streak_count, 3);
        assert_eq!((streak.user_a.as_str(), streak.user_b.as_str()), ("ana", "ben"));

        let reset = db.record_interaction("ben", "ana", at(10, 9), 48).unwrap();
        assert_eq!(reset.streak_count, 1);
        assert_eq!(reset.longest_streak, 3);

        let stored = db.get_streak("ben", "ana").unwrap().unwrap();
        assert_eq!(stored, reset);
    }
}
