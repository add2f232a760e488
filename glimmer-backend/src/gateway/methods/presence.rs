use super::parse_params;
use crate::gateway::protocol::{PresenceParams, RpcError};
use crate::relay::Relay;
use serde_json::Value;

/// Watches above this size are refused outright
pub const MAX_WATCH_BATCH: usize = 500;

pub async fn handle_presence_watch(params: &Value, relay: &Relay, user_id: &str) -> Result<Value, RpcError> {
    let params: PresenceParams = parse_params(params)?;
    if params.user_ids.len() > MAX_WATCH_BATCH {
        return Err(RpcError::invalid_params(format!(
            "Too many user_ids (max {})",
            MAX_WATCH_BATCH
        )));
    }

    let gateway = relay.gateway();
    gateway.presence().watch(user_id, &params.user_ids);

    let statuses: serde_json::Map<String, Value> = params
        .user_ids
        .iter()
        .map(|id| (id.clone(), Value::Bool(gateway.is_online(id))))
        .collect();
    Ok(serde_json::json!({ "online": statuses }))
}

pub async fn handle_presence_unwatch(params: &Value, relay: &Relay, user_id: &str) -> Result<Value, RpcError> {
    let params: PresenceParams = parse_params(params)?;
    relay.gateway().presence().unwatch(user_id, &params.user_ids);
    Ok(serde_json::json!({ "watching": relay.gateway().presence().watching(user_id).len() }))
}
