use super::{parse_params, to_result};
use crate::gateway::protocol::{GameIdParams, GameMoveParams, RpcError};
use crate::relay::Relay;
use serde_json::Value;

pub async fn handle_game_move(params: &Value, relay: &Relay, user_id: &str) -> Result<Value, RpcError> {
    let params: GameMoveParams = parse_params(params)?;
    let view = relay.make_move(user_id, &params.game_id, &params.mv, params.expected_move)?;
    to_result(view)
}

pub async fn handle_game_forfeit(params: &Value, relay: &Relay, user_id: &str) -> Result<Value, RpcError> {
    let params: GameIdParams = parse_params(params)?;
    to_result(relay.forfeit_game(user_id, &params.game_id)?)
}

pub async fn handle_game_get(params: &Value, relay: &Relay, user_id: &str) -> Result<Value, RpcError> {
    let params: GameIdParams = parse_params(params)?;
    to_result(relay.game_for(user_id, &params.game_id)?)
}
