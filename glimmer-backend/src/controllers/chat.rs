use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::controllers::{current_user, parse_cursor, relay_error};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
    /// RFC 3339 cursor: only messages strictly older than this
    pub before: Option<String>,
    /// First message of the previous page, for messages sharing `before`
    #[serde(alias = "beforeId")]
    pub before_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SendRequest {
    content: String,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/chat")
            .route("/{friend_id}", web::get().to(get_history))
            .route("/{friend_id}", web::post().to(send_message)),
    );
}

/// GET /api/chat/{friend_id} - direct conversation with a friend, oldest first
async fn get_history(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<HistoryQuery>,
) -> HttpResponse {
    let user_id = match current_user(&state, &req) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let cursor = match parse_cursor(query.before.as_deref(), query.before_id.as_deref()) {
        Ok(cursor) => cursor,
        Err(resp) => return resp,
    };

    match state.relay.direct_history(&user_id, &path.into_inner(), query.limit, cursor) {
        Ok(messages) => HttpResponse::Ok().json(messages),
        Err(e) => relay_error(e),
    }
}

/// POST /api/chat/{friend_id} - send a message without a socket
async fn send_message(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<SendRequest>,
) -> HttpResponse {
    let user_id = match current_user(&state, &req) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state
        .relay
        .send_direct_message(&user_id, &path.into_inner(), &body.content, None)
    {
        Ok(delivery) => HttpResponse::Created().json(serde_json::json!({
            "message": delivery.message,
            "delivered": delivery.delivered
        })),
        Err(e) => relay_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::test_support::{as_user, state};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_send_and_read_history() {
        let state = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let req = test::TestRequest::post()
            .uri("/api/chat/ben")
            .insert_header(as_user("ana"))
            .set_json(json!({"content": "hello ben"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"]["type"], "text");
        assert_eq!(body["delivered"], 0);

        let req = test::TestRequest::get()
            .uri("/api/chat/ana?limit=10")
            .insert_header(as_user("ben"))
            .to_request();
        let history: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0]["content"], "hello ben");
        assert_eq!(history[0]["receiverId"], "ben");

        let req = test::TestRequest::post()
            .uri("/api/chat/ben")
            .insert_header(as_user("ana"))
            .set_json(json!({"content": "again"}))
            .to_request();
        test::call_service(&app, req).await;

        // Page back from the newest message using its time and id
        let req = test::TestRequest::get()
            .uri("/api/chat/ana?limit=1")
            .insert_header(as_user("ben"))
            .to_request();
        let latest: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(latest[0]["content"], "again");
        let uri = format!(
            "/api/chat/ana?before={}&beforeId={}",
            latest[0]["createdAt"].as_str().unwrap().replace('+', "%2B"),
            latest[0]["id"].as_str().unwrap()
        );
        let req = test::TestRequest::get().uri(&uri).insert_header(as_user("ben")).to_request();
        let older: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(older.len(), 1);
        assert_eq!(older[0]["content"], "hello ben");
    }

    #[actix_web::test]
    async fn test_requires_identity_and_valid_cursor() {
        let state = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let req = test::TestRequest::get().uri("/api/chat/ben").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/api/chat/ben?before=yesterday")
            .insert_header(as_user("ana"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/api/chat/ben?beforeId=m-1")
            .insert_header(as_user("ana"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/chat/ana")
            .insert_header(as_user("ana"))
            .set_json(json!({"content": "talking to myself"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
