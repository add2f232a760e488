use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_USER_ID_LEN: usize = 128;

/// User ids are 1-128 bytes once trimmed
pub fn is_valid_user_id(user_id: &str) -> bool {
    !user_id.is_empty() && user_id.len() <= MAX_USER_ID_LEN
}

/// A user as known to the realtime backend. Accounts themselves live with the
/// auth layer; this row only exists so ids can be resolved and last-seen tracked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
    pub last_active: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
