use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::Value;

use crate::controllers::{current_user, relay_error};
use crate::AppState;

#[derive(Debug, Deserialize)]
struct CreateGameRequest {
    #[serde(alias = "opponentId", alias = "player2Id")]
    opponent_id: String,
    #[serde(alias = "gameType")]
    game_type: String,
}

#[derive(Debug, Deserialize)]
struct MoveRequest {
    #[serde(rename = "move")]
    mv: Value,
    #[serde(default, alias = "expectedMove")]
    expected_move: Option<i64>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/games")
            .route("", web::get().to(list_games))
            .route("", web::post().to(create_game))
            .route("/{id}", web::get().to(get_game))
            .route("/{id}/moves", web::post().to(make_move))
            .route("/{id}/forfeit", web::post().to(forfeit_game)),
    );
}

/// GET /api/games - the caller's active games
async fn list_games(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let user_id = match current_user(&state, &req) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.relay.active_games(&user_id) {
        Ok(games) => HttpResponse::Ok().json(games),
        Err(e) => relay_error(e),
    }
}

/// POST /api/games - challenge a friend
async fn create_game(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateGameRequest>,
) -> HttpResponse {
    let user_id = match current_user(&state, &req) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.relay.create_game(&user_id, &body.opponent_id, &body.game_type) {
        Ok(game) => HttpResponse::Created().json(game),
        Err(e) => relay_error(e),
    }
}

/// GET /api/games/{id} - 404 unless the caller plays in it
async fn get_game(state: web::Data<AppState>, req: HttpRequest, path: web::Path<String>) -> HttpResponse {
    let user_id = match current_user(&state, &req) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.relay.game_for(&user_id, &path.into_inner()) {
        Ok(game) => HttpResponse::Ok().json(game),
        Err(e) => relay_error(e),
    }
}

/// POST /api/games/{id}/moves
async fn make_move(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<MoveRequest>,
) -> HttpResponse {
    let user_id = match current_user(&state, &req) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state
        .relay
        .make_move(&user_id, &path.into_inner(), &body.mv, body.expected_move)
    {
        Ok(game) => HttpResponse::Ok().json(game),
        Err(e) => relay_error(e),
    }
}

/// POST /api/games/{id}/forfeit
async fn forfeit_game(state: web::Data<AppState>, req: HttpRequest, path: web::Path<String>) -> HttpResponse {
    let user_id = match current_user(&state, &req) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.relay.forfeit_game(&user_id, &path.into_inner()) {
        Ok(game) => HttpResponse::Ok().json(game),
        Err(e) => relay_error(e),
    }
}
