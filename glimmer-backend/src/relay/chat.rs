use super::{Relay, RelayError, RelayResult};
use crate::gateway::protocol::GatewayEvent;
use crate::models::{ChatMessage, HistoryCursor, MessageType};

/// A stored message and how many live connections received it
#[derive(Debug, Clone)]
pub struct Delivery {
    pub message: ChatMessage,
    pub delivered: usize,
}

pub const DEFAULT_HISTORY_LIMIT: u32 = 50;
pub const MAX_HISTORY_LIMIT: u32 = 200;

pub fn history_limit(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT)
}

impl Relay {
    /// Persist a direct message and push it to the receiver and to the
    /// sender's other connections (`origin_conn` is the one that sent it).
    pub fn send_direct_message(
        &self,
        sender_id: &str,
        receiver_id: &str,
        content: &str,
        origin_conn: Option<&str>,
    ) -> RelayResult<Delivery> {
        let receiver_id = self.counterpart(receiver_id, "receiver_id")?;
        if receiver_id == sender_id {
            return Err(RelayError::InvalidInput("You cannot message yourself".to_string()));
        }
        let content = self.clean_content(content)?;

        self.db.ensure_user(receiver_id)?;
        let message =
            self.db
                .insert_chat_message(sender_id, Some(receiver_id), None, &content, MessageType::Text)?;
        self.bump_streak(sender_id, receiver_id);

        let event = GatewayEvent::chat_message(&message);
        let delivered = self.gateway.send_to_user(receiver_id, &event);
        match origin_conn {
            Some(conn_id) => self.gateway.send_to_user_except(sender_id, conn_id, &event),
            None => self.gateway.send_to_user(sender_id, &event),
        };

        log::debug!(
            "[RELAY] Message {} from {} to {} delivered to {} connection(s)",
            message.id,
            sender_id,
            receiver_id,
            delivered
        );
        Ok(Delivery { message, delivered })
    }

    /// Relay a typing indicator; nothing is stored
    pub fn send_typing(&self, sender_id: &str, receiver_id: &str, is_typing: bool) -> RelayResult<usize> {
        let receiver_id = self.counterpart(receiver_id, "receiver_id")?;
        if receiver_id == sender_id {
            return Err(RelayError::InvalidInput("Invalid receiver_id".to_string()));
        }
        Ok(self
            .gateway
            .send_to_user(receiver_id, &GatewayEvent::chat_typing(sender_id, is_typing)))
    }

    pub fn direct_history(
        &self,
        user_id: &str,
        friend_id: &str,
        limit: Option<u32>,
        cursor: Option<HistoryCursor>,
    ) -> RelayResult<Vec<ChatMessage>> {
        Ok(self
            .db
            .get_direct_messages(user_id, friend_id, history_limit(limit), cursor.as_ref())?)
    }
}
