use actix_web::{web, HttpRequest, HttpResponse};

use crate::controllers::chat::HistoryQuery;
use crate::controllers::{current_user, parse_cursor, relay_error};
use crate::gateway::rooms::is_valid_room_id;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/rooms")
            .route("/{room_id}", web::get().to(get_room))
            .route("/{room_id}/messages", web::get().to(get_room_messages)),
    );
}

/// GET /api/rooms/{room_id} - current members and who of them is online
async fn get_room(state: web::Data<AppState>, req: HttpRequest, path: web::Path<String>) -> HttpResponse {
    if let Err(resp) = current_user(&state, &req) {
        return resp;
    }
    let room_id = path.into_inner();
    if !is_valid_room_id(&room_id) {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Invalid room id"
        }));
    }

    let members: Vec<serde_json::Value> = state
        .gateway
        .rooms()
        .members(&room_id)
        .into_iter()
        .map(|id| {
            let online = state.gateway.is_online(&id);
            serde_json::json!({ "userId": id, "online": online })
        })
        .collect();

    HttpResponse::Ok().json(serde_json::json!({
        "roomId": room_id,
        "members": members
    }))
}

/// GET /api/rooms/{room_id}/messages - room history, oldest first
async fn get_room_messages(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<HistoryQuery>,
) -> HttpResponse {
    if let Err(resp) = current_user(&state, &req) {
        return resp;
    }
    let cursor = match parse_cursor(query.before.as_deref(), query.before_id.as_deref()) {
        Ok(cursor) => cursor,
        Err(resp) => return resp,
    };

    match state.relay.room_history(&path.into_inner(), query.limit, cursor) {
        Ok(messages) => HttpResponse::Ok().json(messages),
        Err(e) => relay_error(e),
    }
}
