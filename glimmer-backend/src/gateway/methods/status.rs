use super::parse_params;
use crate::gateway::protocol::{AuthParams, RpcError};
use crate::gateway::session::SessionContext;
use crate::models::is_valid_user_id;
use crate::relay::Relay;
use serde_json::Value;

pub async fn handle_ping() -> Result<Value, RpcError> {
    Ok(serde_json::json!("pong"))
}

pub async fn handle_status(relay: &Relay, ctx: &SessionContext) -> Result<Value, RpcError> {
    let registry = relay.gateway().registry();
    let user_id = ctx.user_id.as_deref().unwrap_or_default();
    Ok(serde_json::json!({
        "status": "ok",
        "user_id": user_id,
        "conn_id": ctx.conn_id,
        "open_tabs": registry.connections_of(user_id),
        "online_users": registry.online_users().len(),
        "connections": registry.connection_count(),
        "rooms": relay.gateway().rooms().rooms_of(user_id),
    }))
}

pub async fn handle_auth(params: &Value, relay: &Relay, ctx: &mut SessionContext) -> Result<Value, RpcError> {
    let params: AuthParams = parse_params(params)?;
    authenticate(relay, ctx, &params.user_id)?;
    Ok(serde_json::json!({
        "user_id": ctx.user_id,
        "conn_id": ctx.conn_id,
    }))
}

/// Bind the connection to a user and register it with the gateway.
/// Re-authenticating as the same user is a no-op; switching users is refused.
pub fn authenticate(relay: &Relay, ctx: &mut SessionContext, user_id: &str) -> Result<(), RpcError> {
    let user_id = user_id.trim();
    if !is_valid_user_id(user_id) {
        return Err(RpcError::invalid_params("user_id must be 1-128 characters"));
    }
    if let Some(current) = ctx.user_id.as_deref() {
        if current == user_id {
            return Ok(());
        }
        return Err(RpcError::invalid_request());
    }

    relay.db().touch_user(user_id).map_err(|e| {
        log::error!("[GATEWAY] Failed to record user {}: {}", user_id, e);
        RpcError::internal_error("Database error")
    })?;
    let Some(events) = ctx.take_events() else {
        return Err(RpcError::invalid_request());
    };
    relay.gateway().connect(user_id, &ctx.conn_id, events);
    ctx.user_id = Some(user_id.to_string());
    log::info!("[GATEWAY] Connection {} authenticated as {}", ctx.conn_id, user_id);
    Ok(())
}
