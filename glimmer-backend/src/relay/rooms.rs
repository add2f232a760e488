use super::chat::{history_limit, Delivery};
use super::{Relay, RelayError, RelayResult};
use crate::gateway::protocol::GatewayEvent;
use crate::gateway::rooms::is_valid_room_id;
use crate::models::{ChatMessage, HistoryCursor, MessageType};

fn check_room_id(room_id: &str) -> RelayResult<()> {
    if is_valid_room_id(room_id) {
        Ok(())
    } else {
        Err(RelayError::InvalidInput(
            "room_id must be 1-64 characters of letters, digits, '_' or '-'".to_string(),
        ))
    }
}

impl Relay {
    /// Join a room and announce it to the members already there.
    /// Returns the member list after joining.
    pub fn join_room(&self, user_id: &str, room_id: &str) -> RelayResult<Vec<String>> {
        check_room_id(room_id)?;
        if self.gateway.rooms().join(room_id, user_id) {
            log::debug!("[RELAY] {} joined room {}", user_id, room_id);
            self.gateway
                .send_to_room(room_id, user_id, &GatewayEvent::room_member_joined(room_id, user_id));
        }
        Ok(self.gateway.rooms().members(room_id))
    }

    /// Returns false if the user was not in the room
    pub fn leave_room(&self, user_id: &str, room_id: &str) -> RelayResult<bool> {
        check_room_id(room_id)?;
        let left = self.gateway.rooms().leave(room_id, user_id);
        if left {
            log::debug!("[RELAY] {} left room {}", user_id, room_id);
            self.gateway
                .send_to_room(room_id, user_id, &GatewayEvent::room_member_left(room_id, user_id));
        }
        Ok(left)
    }

    /// Persist a room message and push it to the other members
    pub fn send_room_message(&self, sender_id: &str, room_id: &str, content: &str) -> RelayResult<Delivery> {
        check_room_id(room_id)?;
        if !self.gateway.rooms().is_member(room_id, sender_id) {
            return Err(RelayError::Forbidden("Join the room before sending to it".to_string()));
        }
        let content = self.clean_content(content)?;

        let message = self
            .db
            .insert_chat_message(sender_id, None, Some(room_id), &content, MessageType::Text)?;
        let delivered = self
            .gateway
            .send_to_room(room_id, sender_id, &GatewayEvent::room_message(&message));

        Ok(Delivery { message, delivered })
    }

    pub fn room_history(
        &self,
        room_id: &str,
        limit: Option<u32>,
        cursor: Option<HistoryCursor>,
    ) -> RelayResult<Vec<ChatMessage>> {
        check_room_id(room_id)?;
        Ok(self.db.get_room_messages(room_id, history_limit(limit), cursor.as_ref())?)
    }
}
