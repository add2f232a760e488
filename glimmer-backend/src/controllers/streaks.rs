use actix_web::{web, HttpRequest, HttpResponse};

use crate::controllers::current_user;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api/streaks").route("/{other_id}", web::get().to(get_streak)));
}

/// GET /api/streaks/{other_id} - the friendship streak with another user
async fn get_streak(state: web::Data<AppState>, req: HttpRequest, path: web::Path<String>) -> HttpResponse {
    let user_id = match current_user(&state, &req) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let other_id = path.into_inner();

    match state.db.get_streak(&user_id, &other_id) {
        Ok(Some(streak)) => HttpResponse::Ok().json(streak),
        Ok(None) => HttpResponse::Ok().json(serde_json::json!({
            "userA": user_id.clone().min(other_id.clone()),
            "userB": user_id.max(other_id),
            "streakCount": 0,
            "longestStreak": 0,
            "lastInteraction": null
        })),
        Err(e) => {
            log::error!("Failed to load streak: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal server error"
            }))
        }
    }
}
