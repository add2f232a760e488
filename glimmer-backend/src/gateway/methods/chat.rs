use super::{parse_params, to_result};
use crate::gateway::protocol::{ChatSendParams, RpcError, TypingParams};
use crate::relay::Relay;
use serde_json::Value;

pub async fn handle_chat_send(
    params: &Value,
    relay: &Relay,
    user_id: &str,
    conn_id: &str,
) -> Result<Value, RpcError> {
    let params: ChatSendParams = parse_params(params)?;
    let delivery = relay.send_direct_message(user_id, &params.receiver_id, &params.content, Some(conn_id))?;
    Ok(serde_json::json!({
        "message": to_result(&delivery.message)?,
        "delivered": delivery.delivered,
    }))
}

pub async fn handle_chat_typing(params: &Value, relay: &Relay, user_id: &str) -> Result<Value, RpcError> {
    let params: TypingParams = parse_params(params)?;
    let delivered = relay.send_typing(user_id, &params.receiver_id, params.is_typing)?;
    Ok(serde_json::json!({ "delivered": delivered }))
}
