use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::path::Path;
use std::sync::Arc;

mod config;
mod controllers;
mod db;
mod games;
mod gateway;
mod models;
mod relay;

use config::Config;
use db::Database;
use gateway::Gateway;
use relay::Relay;

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
    pub gateway: Arc<Gateway>,
    pub relay: Arc<Relay>,
}

impl AppState {
    pub fn new(db: Arc<Database>, config: Config) -> Self {
        let gateway = Arc::new(Gateway::new());
        let relay = Arc::new(Relay::new(db.clone(), gateway.clone(), &config));
        Self {
            db,
            config,
            gateway,
            relay,
        }
    }
}

/// SPA fallback handler - serves index.html for client-side routing
async fn spa_fallback(state: web::Data<AppState>) -> actix_web::Result<NamedFile> {
    let dist = state.config.frontend_dist.as_deref().unwrap_or(".");
    Ok(NamedFile::open(Path::new(dist).join("index.html"))?)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Database::with_pool_size(&config.database_url, config.db_pool_size)
        .expect("Failed to initialize database");
    let db = Arc::new(db);

    // Gateway and relay are shared by every worker so all sockets see one registry
    let state = web::Data::new(AppState::new(db, config.clone()));

    log::info!("Starting Glimmer server on port {}", port);
    log::info!(
        "WebSocket endpoint at /ws (heartbeat {}s, timeout {}s)",
        config.ws_heartbeat_secs,
        config.ws_client_timeout_secs
    );
    if let Some(dist) = &config.frontend_dist {
        log::info!("Serving frontend from: {}", dist);
    }

    let frontend_dist = config.frontend_dist.clone();

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        let mut app = App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .wrap(cors)
            .route("/ws", web::get().to(gateway::session::ws_handler))
            .configure(controllers::health::config_routes)
            .configure(controllers::chat::config)
            .configure(controllers::rooms::config)
            .configure(controllers::games::config)
            .configure(controllers::presence::config)
            .configure(controllers::activities::config)
            .configure(controllers::streaks::config);

        // Serve static files only if frontend dist exists
        if let Some(dist) = &frontend_dist {
            app = app.service(
                Files::new("/", dist.clone())
                    .index_file("index.html")
                    .default_handler(web::to(spa_fallback)),
            );
        }

        app
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
