//! Chat, room and game flows.
//!
//! Each flow validates input, persists through [`Database`] and then fans the
//! result out through the [`Gateway`]. The WebSocket methods and the REST
//! controllers both go through here, so a move made over HTTP reaches the
//! players' sockets exactly like one made over the socket.

pub mod chat;
pub mod games;
pub mod rooms;

use crate::config::Config;
use crate::db::{Database, DbError};
use crate::gateway::protocol::RpcError;
use crate::gateway::Gateway;
use crate::models::{is_valid_user_id, MAX_USER_ID_LEN};
use crate::games::GameError;
use actix_web::http::StatusCode;
use chrono::Utc;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Forbidden(String),
}

pub type RelayResult<T> = Result<T, RelayError>;

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RelayError::NotFound(_) => StatusCode::NOT_FOUND,
            RelayError::Forbidden(_) => StatusCode::FORBIDDEN,
            RelayError::Game(e) => match e {
                GameError::NotYourTurn | GameError::GameOver | GameError::StaleMove { .. } => {
                    StatusCode::CONFLICT
                }
                GameError::NotAPlayer => StatusCode::FORBIDDEN,
                GameError::InvalidMove(_) | GameError::SelfPlay | GameError::UnknownGameType(_) => {
                    StatusCode::BAD_REQUEST
                }
                GameError::CorruptState(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Message safe to show a client; storage details stay in the logs
    pub fn public_message(&self) -> String {
        match self {
            RelayError::Db(_) => "Database error".to_string(),
            RelayError::Game(GameError::CorruptState(_)) => "Game state unavailable".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<RelayError> for RpcError {
    fn from(err: RelayError) -> Self {
        if err.status().is_server_error() {
            log::error!("[RELAY] {}", err);
        }
        let message = err.public_message();
        match err.status() {
            StatusCode::BAD_REQUEST => RpcError::invalid_params(message),
            StatusCode::FORBIDDEN => RpcError::forbidden(message),
            StatusCode::NOT_FOUND => RpcError::not_found(message),
            StatusCode::CONFLICT => RpcError::conflict(message),
            _ => RpcError::internal_error(message),
        }
    }
}

/// Shared entry point for every real-time flow
pub struct Relay {
    db: Arc<Database>,
    gateway: Arc<Gateway>,
    max_message_len: usize,
    streak_window_hours: i64,
}

impl Relay {
    pub fn new(db: Arc<Database>, gateway: Arc<Gateway>, config: &Config) -> Self {
        Self {
            db,
            gateway,
            max_message_len: config.max_message_len,
            streak_window_hours: config.streak_window_hours,
        }
    }

    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    /// Trim and check the id of the other party of an action
    fn counterpart<'a>(&self, user_id: &'a str, field: &str) -> RelayResult<&'a str> {
        let user_id = user_id.trim();
        if !is_valid_user_id(user_id) {
            return Err(RelayError::InvalidInput(format!(
                "{} must be 1-{} characters",
                field, MAX_USER_ID_LEN
            )));
        }
        Ok(user_id)
    }

    /// Trim and bound user-supplied text
    fn clean_content(&self, content: &str) -> RelayResult<String> {
        let content = content.trim();
        if content.is_empty() {
            return Err(RelayError::InvalidInput("Message content cannot be empty".to_string()));
        }
        let len = content.chars().count();
        if len > self.max_message_len {
            return Err(RelayError::InvalidInput(format!(
                "Message is too long ({} characters, max {})",
                len, self.max_message_len
            )));
        }
        Ok(content.to_string())
    }

    /// Count an interaction towards the pair's streak. Failure is logged and
    /// does not undo the interaction itself.
    fn bump_streak(&self, user_1: &str, user_2: &str) {
        match self
            .db
            .record_interaction(user_1, user_2, Utc::now(), self.streak_window_hours)
        {
            Ok(streak) => log::debug!(
                "[RELAY] Streak {}/{} is now {}",
                streak.user_a,
                streak.user_b,
                streak.streak_count
            ),
            Err(e) => log::error!("[RELAY] Failed to record streak for {}/{}: {}", user_1, user_2, e),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::gateway::protocol::GatewayEvent;
    use crate::gateway::ConnectionRegistry;
    use tokio::sync::mpsc;

    pub fn relay() -> Relay {
        let db = Arc::new(Database::new(":memory:").expect("in-memory db"));
        let gateway = Arc::new(Gateway::new());
        let config = Config {
            max_message_len: 20,
            ..Config::default()
        };
        Relay::new(db, gateway, &config)
    }

    /// Connect a user with one socket and return its event receiver
    pub fn connect(relay: &Relay, user_id: &str, conn_id: &str) -> mpsc::Receiver<GatewayEvent> {
        relay.db().touch_user(user_id).expect("touch user");
        let (tx, rx) = ConnectionRegistry::channel();
        relay.gateway().connect(user_id, conn_id, tx);
        rx
    }

    pub fn drain(rx: &mut mpsc::Receiver<GatewayEvent>) -> Vec<GatewayEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }
}
