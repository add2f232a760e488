use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};

pub const MAX_ROOM_ID_LEN: usize = 64;

/// Room ids are 1-64 characters of `[A-Za-z0-9_-]`
pub fn is_valid_room_id(room_id: &str) -> bool {
    !room_id.is_empty()
        && room_id.len() <= MAX_ROOM_ID_LEN
        && room_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[derive(Default)]
struct RoomState {
    /// room id -> members
    members: HashMap<String, BTreeSet<String>>,
    /// user id -> rooms joined
    joined: HashMap<String, BTreeSet<String>>,
}

/// In-memory room membership. Rooms exist while they have members.
///
/// Both directions of the membership are kept under one lock so they can
/// never disagree.
#[derive(Default)]
pub struct RoomRegistry {
    state: RwLock<RoomState>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the user was already a member
    pub fn join(&self, room_id: &str, user_id: &str) -> bool {
        let mut state = self.state.write();
        let added = state
            .members
            .entry(room_id.to_string())
            .or_default()
            .insert(user_id.to_string());
        state
            .joined
            .entry(user_id.to_string())
            .or_default()
            .insert(room_id.to_string());
        added
    }

    /// Returns false if the user was not a member
    pub fn leave(&self, room_id: &str, user_id: &str) -> bool {
        let mut state = self.state.write();
        let removed = match state.members.get_mut(room_id) {
            Some(members) => {
                let removed = members.remove(user_id);
                if members.is_empty() {
                    state.members.remove(room_id);
                }
                removed
            }
            None => false,
        };
        if let Some(rooms) = state.joined.get_mut(user_id) {
            rooms.remove(room_id);
            if rooms.is_empty() {
                state.joined.remove(user_id);
            }
        }
        removed
    }

    /// Remove the user from every room; returns the rooms they were in.
    pub fn leave_all(&self, user_id: &str) -> Vec<String> {
        let mut state = self.state.write();
        let rooms: Vec<String> = state
            .joined
            .remove(user_id)
            .map(|rooms| rooms.into_iter().collect())
            .unwrap_or_default();
        for room_id in &rooms {
            if let Some(members) = state.members.get_mut(room_id) {
                members.remove(user_id);
                if members.is_empty() {
                    state.members.remove(room_id);
                }
            }
        }
        rooms
    }

    pub fn is_member(&self, room_id: &str, user_id: &str) -> bool {
        self.state
            .read()
            .members
            .get(room_id)
            .is_some_and(|members| members.contains(user_id))
    }

    /// Members in id order; empty for an unknown room
    pub fn members(&self, room_id: &str) -> Vec<String> {
        self.state
            .read()
            .members
            .get(room_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn rooms_of(&self, user_id: &str) -> Vec<String> {
        self.state
            .read()
            .joined
            .get(user_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.state.read().members.len()
    }
}
