use crate::gateway::protocol::GatewayEvent;
use dashmap::DashMap;
use tokio::sync::mpsc;

/// Outbound buffer per connection; a client that falls this far behind is dropped
pub const CONNECTION_BUFFER: usize = 100;

/// One live socket of a user
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub conn_id: String,
    sender: mpsc::Sender<GatewayEvent>,
}

/// Result of a fan-out to one user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SendOutcome {
    pub delivered: usize,
    /// The send dropped the user's last connection
    pub went_offline: bool,
}

/// Tracks every live WebSocket connection, keyed by user.
///
/// A user is online while at least one connection is registered. Delivery is
/// best-effort: a connection whose channel is full or closed is removed on the
/// spot, the same way a lagging subscriber is dropped from a broadcast.
pub struct ConnectionRegistry {
    users: DashMap<String, Vec<ConnectionHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
        }
    }

    /// Create the outbound channel for a new connection
    pub fn channel() -> (mpsc::Sender<GatewayEvent>, mpsc::Receiver<GatewayEvent>) {
        mpsc::channel(CONNECTION_BUFFER)
    }

    /// Add a connection; returns true when this made the user online.
    pub fn register(&self, user_id: &str, conn_id: &str, sender: mpsc::Sender<GatewayEvent>) -> bool {
        let mut conns = self.users.entry(user_id.to_string()).or_default();
        let was_offline = conns.is_empty();
        conns.retain(|c| c.conn_id != conn_id);
        conns.push(ConnectionHandle {
            conn_id: conn_id.to_string(),
            sender,
        });
        log::debug!(
            "[GATEWAY] Registered connection {} for user {} ({} open)",
            conn_id,
            user_id,
            conns.len()
        );
        was_offline
    }

    /// Remove a connection; returns true when this made the user offline.
    pub fn unregister(&self, user_id: &str, conn_id: &str) -> bool {
        if let Some(mut conns) = self.users.get_mut(user_id) {
            conns.retain(|c| c.conn_id != conn_id);
        }
        let went_offline = self.remove_if_empty(user_id);
        log::debug!("[GATEWAY] Unregistered connection {} for user {}", conn_id, user_id);
        went_offline
    }

    fn remove_if_empty(&self, user_id: &str) -> bool {
        self.users.remove_if(user_id, |_, conns| conns.is_empty()).is_some()
    }

    /// Deliver an event to every connection of a user
    pub fn send_to_user(&self, user_id: &str, event: &GatewayEvent) -> SendOutcome {
        self.send_filtered(user_id, None, event)
    }

    /// Deliver an event to every connection of a user except `except_conn`
    pub fn send_to_user_except(&self, user_id: &str, except_conn: &str, event: &GatewayEvent) -> SendOutcome {
        self.send_filtered(user_id, Some(except_conn), event)
    }

    fn send_filtered(&self, user_id: &str, except_conn: Option<&str>, event: &GatewayEvent) -> SendOutcome {
        let mut outcome = SendOutcome::default();
        let mut dropped = 0;

        if let Some(mut conns) = self.users.get_mut(user_id) {
            conns.retain(|conn| {
                if Some(conn.conn_id.as_str()) == except_conn {
                    return true;
                }
                if conn.sender.try_send(event.clone()).is_ok() {
                    outcome.delivered += 1;
                    true
                } else {
                    // Client channel full or closed
                    log::debug!(
                        "[GATEWAY] Dropping connection {} of user {}: channel full or closed",
                        conn.conn_id,
                        user_id
                    );
                    dropped += 1;
                    false
                }
            });
        } else {
            return outcome;
        }

        if dropped > 0 {
            outcome.went_offline = self.remove_if_empty(user_id);
        }

        log::debug!(
            "[GATEWAY] Sent '{}' to {} connection(s) of {}",
            event.event,
            outcome.delivered,
            user_id
        );
        outcome
    }

    pub fn is_online(&self, user_id: &str) -> bool {
        self.users.get(user_id).is_some_and(|conns| !conns.is_empty())
    }

    /// Whether this exact connection is still registered for the user
    pub fn is_registered(&self, user_id: &str, conn_id: &str) -> bool {
        self.users
            .get(user_id)
            .is_some_and(|conns| conns.iter().any(|c| c.conn_id == conn_id))
    }

    pub fn online_users(&self) -> Vec<String> {
        self.users
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Total number of open connections across all users
    pub fn connection_count(&self) -> usize {
        self.users.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn connections_of(&self, user_id: &str) -> usize {
        self.users.get(user_id).map_or(0, |conns| conns.len())
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
