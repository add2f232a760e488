mod chat;
mod games;
mod presence;
mod rooms;
mod status;

pub use chat::{handle_chat_send, handle_chat_typing};
pub use games::{handle_game_forfeit, handle_game_get, handle_game_move};
pub use presence::{handle_presence_unwatch, handle_presence_watch};
pub use rooms::{handle_room_join, handle_room_leave, handle_room_send};
pub use status::{authenticate, handle_auth, handle_ping, handle_status};

use crate::gateway::protocol::RpcError;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub(crate) fn parse_params<T: DeserializeOwned>(params: &Value) -> Result<T, RpcError> {
    serde_json::from_value(params.clone()).map_err(|e| RpcError::invalid_params(format!("Invalid params: {}", e)))
}

pub(crate) fn to_result<T: serde::Serialize>(value: T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError::internal_error(e.to_string()))
}
