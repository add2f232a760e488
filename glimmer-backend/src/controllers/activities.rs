use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::controllers::current_user;
use crate::AppState;

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
struct ActivityQuery {
    limit: Option<u32>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/activities").route(web::get().to(list_activities)));
}

/// GET /api/activities - the caller's feed, newest first
async fn list_activities(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ActivityQuery>,
) -> HttpResponse {
    let user_id = match current_user(&state, &req) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    match state.db.list_activities(&user_id, limit) {
        Ok(activities) => HttpResponse::Ok().json(activities),
        Err(e) => {
            log::error!("Failed to list activities for {}: {}", user_id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal server error"
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::test_support::{as_user, state};
    use crate::models::ActivityType;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_feed_limit() {
        let state = state();
        state.db.touch_user("ana").unwrap();
        for i in 0..3 {
            state
                .db
                .insert_activity("ana", ActivityType::GamePlayed, &format!("game {}", i), json!({}))
                .unwrap();
        }

        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;
        let req = test::TestRequest::get()
            .uri("/api/activities?limit=2")
            .insert_header(as_user("ana"))
            .to_request();
        let feed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0]["description"], "game 2");
        assert_eq!(feed[0]["type"], "game_played");

        let req = test::TestRequest::get().uri("/api/activities").insert_header(as_user("ben")).to_request();
        let feed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert!(feed.is_empty());
    }
}
