use actix_web::{web, HttpResponse, Responder};

use crate::AppState;

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/health").route(web::get().to(health_check)));
    cfg.service(web::resource("/api/version").route(web::get().to(get_version)));
    cfg.service(web::resource("/api/health/status").route(web::get().to(get_gateway_status)));
}

async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": VERSION
    }))
}

async fn get_version() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "version": VERSION
    }))
}

async fn get_gateway_status(state: web::Data<AppState>) -> impl Responder {
    let registry = state.gateway.registry();
    HttpResponse::Ok().json(serde_json::json!({
        "online_users": registry.online_users().len(),
        "connections": registry.connection_count(),
        "rooms": state.gateway.rooms().room_count()
    }))
}
