use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a history page ends. Messages strictly older than `before` come
/// back, plus those stored at the same instant ahead of message `before_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryCursor {
    pub before: DateTime<Utc>,
    pub before_id: Option<String>,
}

impl HistoryCursor {
    /// Cursor positioned just before an already loaded message
    pub fn at(message: &ChatMessage) -> Self {
        Self {
            before: message.created_at,
            before_id: Some(message.id.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    GameInvite,
    System,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::GameInvite => "game_invite",
            MessageType::System => "system",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "text" => Some(MessageType::Text),
            "game_invite" => Some(MessageType::GameInvite),
            "system" => Some(MessageType::System),
            _ => None,
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored chat message: direct (`receiver_id` set) or room (`room_id` set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: Option<String>,
    pub room_id: Option<String>,
    pub content: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub created_at: DateTime<Utc>,
}
