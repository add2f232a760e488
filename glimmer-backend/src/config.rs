use std::env;
use std::str::FromStr;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const DB_POOL_SIZE: &str = "GLIMMER_DB_POOL_SIZE";
    pub const STREAK_WINDOW_HOURS: &str = "GLIMMER_STREAK_WINDOW_HOURS";
    pub const WS_HEARTBEAT_SECS: &str = "GLIMMER_WS_HEARTBEAT_SECS";
    pub const WS_CLIENT_TIMEOUT_SECS: &str = "GLIMMER_WS_CLIENT_TIMEOUT_SECS";
    pub const MAX_MESSAGE_LEN: &str = "GLIMMER_MAX_MESSAGE_LEN";
    pub const FRONTEND_DIST: &str = "GLIMMER_FRONTEND_DIST";
    pub const DISABLE_FRONTEND: &str = "DISABLE_FRONTEND";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 5000;
    pub const DATABASE_URL: &str = "./.db/glimmer.db";
    pub const DB_POOL_SIZE: u32 = 8;
    pub const STREAK_WINDOW_HOURS: i64 = 48;
    pub const WS_HEARTBEAT_SECS: u64 = 30;
    pub const WS_CLIENT_TIMEOUT_SECS: u64 = 90;
    pub const MAX_MESSAGE_LEN: usize = 2000;
    pub const FRONTEND_DIST: [&str; 2] = ["./client/dist", "../client/dist"];
}

/// Parse an env var, falling back to the default (with a warning) when it is malformed.
fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                log::warn!("{} has invalid value {:?}, using default", name, raw);
                default
            }
        },
        Err(_) => default,
    }
}

fn flag(name: &str) -> bool {
    env::var(name)
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub db_pool_size: u32,
    /// Rolling window for friendship streaks
    pub streak_window_hours: i64,
    pub ws_heartbeat_secs: u64,
    pub ws_client_timeout_secs: u64,
    /// Upper bound on chat message length, in characters
    pub max_message_len: usize,
    /// Frontend dist directory; None disables static file serving
    pub frontend_dist: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: defaults::PORT,
            database_url: defaults::DATABASE_URL.to_string(),
            db_pool_size: defaults::DB_POOL_SIZE,
            streak_window_hours: defaults::STREAK_WINDOW_HOURS,
            ws_heartbeat_secs: defaults::WS_HEARTBEAT_SECS,
            ws_client_timeout_secs: defaults::WS_CLIENT_TIMEOUT_SECS,
            max_message_len: defaults::MAX_MESSAGE_LEN,
            frontend_dist: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut ws_heartbeat_secs = parse_or(env_vars::WS_HEARTBEAT_SECS, defaults::WS_HEARTBEAT_SECS);
        if ws_heartbeat_secs == 0 {
            log::warn!("{} must be positive, using default", env_vars::WS_HEARTBEAT_SECS);
            ws_heartbeat_secs = defaults::WS_HEARTBEAT_SECS;
        }
        let mut ws_client_timeout_secs =
            parse_or(env_vars::WS_CLIENT_TIMEOUT_SECS, defaults::WS_CLIENT_TIMEOUT_SECS);
        if ws_client_timeout_secs <= ws_heartbeat_secs {
            // A timeout shorter than the ping interval would drop healthy clients
            ws_client_timeout_secs = ws_heartbeat_secs * 3;
            log::warn!(
                "{} must exceed the heartbeat interval, using {}s",
                env_vars::WS_CLIENT_TIMEOUT_SECS,
                ws_client_timeout_secs
            );
        }

        Self {
            port: parse_or(env_vars::PORT, defaults::PORT),
            database_url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.to_string()),
            db_pool_size: parse_or(env_vars::DB_POOL_SIZE, defaults::DB_POOL_SIZE).max(1),
            streak_window_hours: parse_or(env_vars::STREAK_WINDOW_HOURS, defaults::STREAK_WINDOW_HOURS)
                .max(1),
            ws_heartbeat_secs,
            ws_client_timeout_secs,
            max_message_len: parse_or(env_vars::MAX_MESSAGE_LEN, defaults::MAX_MESSAGE_LEN).max(1),
            frontend_dist: resolve_frontend_dist(),
        }
    }
}

/// Determine frontend dist path.
/// Set DISABLE_FRONTEND=1 to disable static file serving (for a separate dev server).
fn resolve_frontend_dist() -> Option<String> {
    if flag(env_vars::DISABLE_FRONTEND) {
        log::info!("Frontend serving disabled via DISABLE_FRONTEND env var");
        return None;
    }
    if let Ok(dir) = env::var(env_vars::FRONTEND_DIST) {
        return Some(dir);
    }
    let found = defaults::FRONTEND_DIST
        .iter()
        .find(|p| std::path::Path::new(p).exists())
        .map(|p| p.to_string());
    if found.is_none() {
        log::warn!("Frontend dist not found in ./client/dist or ../client/dist - static file serving disabled");
    }
    found
}
