use crate::models::{Activity, ChatMessage, GameView};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event types pushed to connected clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    // Direct chat
    ChatMessage,
    ChatTyping,
    // Games
    GameInvite,
    GameUpdate,
    // Presence
    PresenceChanged,
    // Rooms
    RoomMessage,
    RoomMemberJoined,
    RoomMemberLeft,
    // Feed
    ActivityCreated,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChatMessage => "chat.message",
            Self::ChatTyping => "chat.typing",
            Self::GameInvite => "game.invite",
            Self::GameUpdate => "game.update",
            Self::PresenceChanged => "presence.changed",
            Self::RoomMessage => "room.message",
            Self::RoomMemberJoined => "room.member_joined",
            Self::RoomMemberLeft => "room.member_left",
            Self::ActivityCreated => "activity.created",
        }
    }

    pub fn from_str(s: &str) -> Option<EventType> {
        match s {
            "chat.message" => Some(EventType::ChatMessage),
            "chat.typing" => Some(EventType::ChatTyping),
            "game.invite" => Some(EventType::GameInvite),
            "game.update" => Some(EventType::GameUpdate),
            "presence.changed" => Some(EventType::PresenceChanged),
            "room.message" => Some(EventType::RoomMessage),
            "room.member_joined" => Some(EventType::RoomMemberJoined),
            "room.member_left" => Some(EventType::RoomMemberLeft),
            "activity.created" => Some(EventType::ActivityCreated),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        event_type.as_str().to_string()
    }
}

/// JSON-RPC request from client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// JSON-RPC response to client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn success(id: String, result: Value) -> Self {
        Self {
            type_: "response".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: String, error: RpcError) -> Self {
        Self {
            type_: "response".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// Application error codes, outside the range reserved by JSON-RPC
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    pub const NOT_AUTHENTICATED: i32 = -32001;
    pub const FORBIDDEN: i32 = -32003;
    pub const NOT_FOUND: i32 = -32004;
    pub const CONFLICT: i32 = -32009;
}

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn parse_error() -> Self {
        Self::new(codes::PARSE_ERROR, "Parse error")
    }

    pub fn invalid_request() -> Self {
        Self::new(codes::INVALID_REQUEST, "Invalid request")
    }

    pub fn method_not_found() -> Self {
        Self::new(codes::METHOD_NOT_FOUND, "Method not found")
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(codes::INVALID_PARAMS, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL_ERROR, message)
    }

    pub fn not_authenticated() -> Self {
        Self::new(codes::NOT_AUTHENTICATED, "not_authenticated")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(codes::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(codes::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(codes::CONFLICT, message)
    }
}

/// Server-push event to a user's connections
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayEvent {
    #[serde(rename = "type")]
    pub type_: String,
    pub event: String,
    pub data: Value,
}

impl GatewayEvent {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            type_: "event".to_string(),
            event: event.into(),
            data,
        }
    }

    pub fn chat_message(message: &ChatMessage) -> Self {
        Self::new(EventType::ChatMessage, serde_json::json!(message))
    }

    pub fn chat_typing(sender_id: &str, is_typing: bool) -> Self {
        Self::new(
            EventType::ChatTyping,
            serde_json::json!({
                "senderId": sender_id,
                "isTyping": is_typing
            }),
        )
    }

    pub fn game_invite(game: &GameView, from: &str, message_id: &str) -> Self {
        Self::new(
            EventType::GameInvite,
            serde_json::json!({
                "from": from,
                "messageId": message_id,
                "game": game
            }),
        )
    }

    pub fn game_update(game: &GameView) -> Self {
        Self::new(EventType::GameUpdate, serde_json::json!(game))
    }

    pub fn presence_changed(user_id: &str, online: bool) -> Self {
        Self::new(
            EventType::PresenceChanged,
            serde_json::json!({
                "userId": user_id,
                "online": online
            }),
        )
    }

    pub fn room_message(message: &ChatMessage) -> Self {
        Self::new(EventType::RoomMessage, serde_json::json!(message))
    }

    pub fn room_member_joined(room_id: &str, user_id: &str) -> Self {
        Self::new(
            EventType::RoomMemberJoined,
            serde_json::json!({
                "roomId": room_id,
                "userId": user_id
            }),
        )
    }

    pub fn room_member_left(room_id: &str, user_id: &str) -> Self {
        Self::new(
            EventType::RoomMemberLeft,
            serde_json::json!({
                "roomId": room_id,
                "userId": user_id
            }),
        )
    }

    pub fn activity_created(activity: &Activity) -> Self {
        Self::new(EventType::ActivityCreated, serde_json::json!(activity))
    }
}

/// Params for `auth`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthParams {
    #[serde(alias = "userId")]
    pub user_id: String,
}

/// Params for `chat.send`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatSendParams {
    #[serde(alias = "receiverId")]
    pub receiver_id: String,
    pub content: String,
}

/// Params for `chat.typing`
#[derive(Debug, Clone, Deserialize)]
pub struct TypingParams {
    #[serde(alias = "receiverId")]
    pub receiver_id: String,
    #[serde(default = "default_true", alias = "isTyping")]
    pub is_typing: bool,
}

fn default_true() -> bool {
    true
}

/// Params for `game.move`
#[derive(Debug, Clone, Deserialize)]
pub struct GameMoveParams {
    #[serde(alias = "gameId")]
    pub game_id: String,
    #[serde(rename = "move")]
    pub mv: Value,
    #[serde(default, alias = "expectedMove")]
    pub expected_move: Option<i64>,
}

/// Params for `game.get` and `game.forfeit`
#[derive(Debug, Clone, Deserialize)]
pub struct GameIdParams {
    #[serde(alias = "gameId")]
    pub game_id: String,
}

/// Params for `room.join` and `room.leave`
#[derive(Debug, Clone, Deserialize)]
pub struct RoomParams {
    #[serde(alias = "roomId")]
    pub room_id: String,
}

/// Params for `room.send`
#[derive(Debug, Clone, Deserialize)]
pub struct RoomSendParams {
    #[serde(alias = "roomId")]
    pub room_id: String,
    pub content: String,
}

/// Params for `presence.watch` and `presence.unwatch`
#[derive(Debug, Clone, Deserialize)]
pub struct PresenceParams {
    #[serde(alias = "userIds")]
    pub user_ids: Vec<String>,
}
