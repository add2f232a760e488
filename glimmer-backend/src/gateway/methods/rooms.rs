use super::{parse_params, to_result};
use crate::gateway::protocol::{RoomParams, RoomSendParams, RpcError};
use crate::relay::Relay;
use serde_json::Value;

pub async fn handle_room_join(params: &Value, relay: &Relay, user_id: &str) -> Result<Value, RpcError> {
    let params: RoomParams = parse_params(params)?;
    let members = relay.join_room(user_id, &params.room_id)?;
    Ok(serde_json::json!({
        "room_id": params.room_id,
        "members": members,
    }))
}

pub async fn handle_room_leave(params: &Value, relay: &Relay, user_id: &str) -> Result<Value, RpcError> {
    let params: RoomParams = parse_params(params)?;
    let left = relay.leave_room(user_id, &params.room_id)?;
    Ok(serde_json::json!({
        "room_id": params.room_id,
        "left": left,
    }))
}

pub async fn handle_room_send(params: &Value, relay: &Relay, user_id: &str) -> Result<Value, RpcError> {
    let params: RoomSendParams = parse_params(params)?;
    let delivery = relay.send_room_message(user_id, &params.room_id, &params.content)?;
    Ok(serde_json::json!({
        "message": to_result(&delivery.message)?,
        "delivered": delivery.delivered,
    }))
}
