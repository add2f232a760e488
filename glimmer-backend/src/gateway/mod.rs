pub mod methods;
pub mod presence;
pub mod protocol;
pub mod registry;
pub mod rooms;
pub mod session;

pub use protocol::GatewayEvent;
pub use registry::ConnectionRegistry;

use parking_lot::Mutex;
use presence::PresenceWatchers;
use rooms::RoomRegistry;
use tokio::sync::mpsc;

/// Real-time hub: who is connected, who watches whom, who is in which room.
///
/// Every delivery goes through here so that a connection dropped during a
/// send is followed by the same offline handling as a clean disconnect.
pub struct Gateway {
    registry: ConnectionRegistry,
    presence: PresenceWatchers,
    rooms: RoomRegistry,
    /// Held while a user's online/offline transition and its notices run
    transitions: Mutex<()>,
}

impl Gateway {
    pub fn new() -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            presence: PresenceWatchers::new(),
            rooms: RoomRegistry::new(),
            transitions: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn presence(&self) -> &PresenceWatchers {
        &self.presence
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    /// Register a connection for `user_id`, announcing them if they just came online
    pub fn connect(&self, user_id: &str, conn_id: &str, sender: mpsc::Sender<GatewayEvent>) {
        let pending = {
            let _guard = self.transitions.lock();
            if !self.registry.register(user_id, conn_id, sender) {
                return;
            }
            log::info!("[GATEWAY] {} is online", user_id);
            self.notify_watchers(user_id, true)
        };
        self.settle_offline(pending);
    }

    /// Remove a connection, running offline handling if it was the last one.
    ///
    /// A connection evicted earlier may have picked up rooms or watches after
    /// its user was settled; those are released here without a second notice.
    pub fn disconnect(&self, user_id: &str, conn_id: &str) {
        if self.registry.unregister(user_id, conn_id) {
            self.settle_offline(vec![user_id.to_string()]);
            return;
        }
        let pending = {
            let _guard = self.transitions.lock();
            if self.registry.is_online(user_id) {
                return;
            }
            self.release(user_id)
        };
        self.settle_offline(pending);
    }

    /// Deliver to all of a user's connections; returns the delivery count
    pub fn send_to_user(&self, user_id: &str, event: &GatewayEvent) -> usize {
        let outcome = self.registry.send_to_user(user_id, event);
        if outcome.went_offline {
            self.settle_offline(vec![user_id.to_string()]);
        }
        outcome.delivered
    }

    /// Deliver to a user's connections other than `except_conn`
    pub fn send_to_user_except(&self, user_id: &str, except_conn: &str, event: &GatewayEvent) -> usize {
        let outcome = self.registry.send_to_user_except(user_id, except_conn, event);
        if outcome.went_offline {
            self.settle_offline(vec![user_id.to_string()]);
        }
        outcome.delivered
    }

    /// Deliver to every member of a room except `sender_id`; returns the delivery count
    pub fn send_to_room(&self, room_id: &str, sender_id: &str, event: &GatewayEvent) -> usize {
        self.rooms
            .members(room_id)
            .iter()
            .filter(|member| member.as_str() != sender_id)
            .map(|member| self.send_to_user(member, event))
            .sum()
    }

    pub fn is_online(&self, user_id: &str) -> bool {
        self.registry.is_online(user_id)
    }

    /// Notifications triggered by a user going offline can themselves drop
    /// lagging connections, so offline users are worked off as a queue.
    /// Each user is re-checked under the transition lock, so a reconnect that
    /// won the race keeps its rooms and its online notice stands.
    fn settle_offline(&self, mut pending: Vec<String>) {
        while let Some(user_id) = pending.pop() {
            let _guard = self.transitions.lock();
            if self.registry.is_online(&user_id) {
                continue;
            }
            log::info!("[GATEWAY] {} is offline", user_id);

            pending.extend(self.release(&user_id));
            pending.extend(self.notify_watchers(&user_id, false));
        }
    }

    /// Leave every room and drop every watch of an offline user.
    /// Returns members whose last connection was dropped by the notices.
    fn release(&self, user_id: &str) -> Vec<String> {
        let mut dropped = Vec::new();
        for room_id in self.rooms.leave_all(user_id) {
            let event = GatewayEvent::room_member_left(&room_id, user_id);
            for member in self.rooms.members(&room_id) {
                if self.registry.send_to_user(&member, &event).went_offline {
                    dropped.push(member);
                }
            }
        }
        self.presence.drop_watcher(user_id);
        dropped
    }

    /// Returns watchers whose last connection was dropped by the notice
    fn notify_watchers(&self, user_id: &str, online: bool) -> Vec<String> {
        let event = GatewayEvent::presence_changed(user_id, online);
        self.presence
            .watchers_of(user_id)
            .into_iter()
            .filter(|watcher| self.registry.send_to_user(watcher, &event).went_offline)
            .collect()
    }
}

impl Default for Gateway {
    fn default() -> Self {
        Self::new()
    }
}
