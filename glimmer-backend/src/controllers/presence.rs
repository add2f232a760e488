use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::controllers::current_user;
use crate::models::is_valid_user_id;
use crate::AppState;

/// Lookups above this size are refused
const MAX_LOOKUP: usize = 200;

#[derive(Debug, Deserialize)]
struct PresenceQuery {
    /// Comma-separated user ids
    ids: String,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/presence").route(web::get().to(get_presence)));
}

/// GET /api/presence?ids=a,b - online flag and last activity per user
async fn get_presence(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<PresenceQuery>,
) -> HttpResponse {
    if let Err(resp) = current_user(&state, &req) {
        return resp;
    }

    let ids: Vec<&str> = query
        .ids
        .split(',')
        .map(str::trim)
        .filter(|id| is_valid_user_id(id))
        .collect();
    if ids.len() > MAX_LOOKUP {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": format!("At most {} ids per request", MAX_LOOKUP)
        }));
    }

    let mut statuses = Vec::with_capacity(ids.len());
    for id in ids {
        let last_active = match state.db.get_user(id) {
            Ok(user) => user.map(|u| u.last_active),
            Err(e) => {
                log::error!("Failed to load user {}: {}", id, e);
                return HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Internal server error"
                }));
            }
        };
        statuses.push(serde_json::json!({
            "userId": id,
            "online": state.gateway.is_online(id),
            "lastActive": last_active
        }));
    }

    HttpResponse::Ok().json(statuses)
}
