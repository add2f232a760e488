use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Interaction streak between two users. The pair is stored ordered (`user_a < user_b`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendStreak {
    pub user_a: String,
    pub user_b: String,
    pub streak_count: i64,
    pub longest_streak: i64,
    pub last_interaction: DateTime<Utc>,
}

impl FriendStreak {
    /// Order a pair the way it is keyed in storage.
    pub fn key(a: &str, b: &str) -> (String, String) {
        if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }
}
