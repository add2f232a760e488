pub mod activities;
pub mod chat;
pub mod games;
pub mod health;
pub mod presence;
pub mod rooms;
pub mod streaks;

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};

use crate::models::{is_valid_user_id, HistoryCursor};
use crate::relay::RelayError;
use crate::AppState;

/// Header carrying the user id asserted by the upstream auth layer
pub const IDENTITY_HEADER: &str = "X-Glimmer-User";

/// The asserted user id, if present and well-formed
pub fn identity_from_request(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(IDENTITY_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| is_valid_user_id(s))
}

/// Shared identity check for controller handlers. Refreshes the user's
/// `last_active` on every authenticated request.
pub fn current_user(state: &web::Data<AppState>, req: &HttpRequest) -> Result<String, HttpResponse> {
    let Some(user_id) = identity_from_request(req) else {
        return Err(HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "Unauthorized"
        })));
    };

    match state.db.touch_user(&user_id) {
        Ok(()) => Ok(user_id),
        Err(e) => {
            log::error!("Failed to record user {}: {}", user_id, e);
            Err(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal server error"
            })))
        }
    }
}

/// Map a flow error to a JSON error response
pub fn relay_error(err: RelayError) -> HttpResponse {
    let status = err.status();
    if status.is_server_error() {
        log::error!("[RELAY] {}", err);
    }
    HttpResponse::build(status).json(serde_json::json!({
        "error": err.public_message()
    }))
}

/// Parse the optional `before` (RFC 3339) and `beforeId` history cursor
pub fn parse_cursor(before: Option<&str>, before_id: Option<&str>) -> Result<Option<HistoryCursor>, HttpResponse> {
    let bad_request = |error: &str| {
        HttpResponse::BadRequest().json(serde_json::json!({
            "error": error
        }))
    };
    match (before, before_id) {
        (None, None) => Ok(None),
        (None, Some(_)) => Err(bad_request("beforeId requires before")),
        (Some(raw), before_id) => {
            let before = DateTime::parse_from_rfc3339(raw)
                .map_err(|_| bad_request("before must be an RFC 3339 timestamp"))?
                .with_timezone(&Utc);
            Ok(Some(HistoryCursor {
                before,
                before_id: before_id.map(str::to_string),
            }))
        }
    }
}
