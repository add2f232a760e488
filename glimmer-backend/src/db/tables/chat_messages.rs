//! Chat message database operations (direct conversations and rooms)

use chrono::Utc;
use uuid::Uuid;

use crate::db::sqlite::{parse_timestamp, timestamp, unknown_variant};
use crate::db::{Database, DbResult};
use crate::models::{ChatMessage, HistoryCursor, MessageType};

const MESSAGE_COLUMNS: &str =
    "id, sender_id, receiver_id, room_id, content, message_type, created_at";

/// Keyset condition over `(created_at, rowid)`. Parameter `?{at}` is the
/// cursor time and `?{at + 1}` the id of the first message of the previous page.
fn before_cursor(at: usize) -> String {
    let id = at + 1;
    format!(
        "(?{at} IS NULL OR created_at < ?{at}
          OR (created_at = ?{at} AND rowid < (SELECT rowid FROM chat_messages WHERE id = ?{id})))"
    )
}

fn cursor_params(cursor: Option<&HistoryCursor>) -> (Option<String>, Option<&str>) {
    match cursor {
        Some(cursor) => (Some(timestamp(&cursor.before)), cursor.before_id.as_deref()),
        None => (None, None),
    }
}

impl Database {
    /// Store a message. Exactly one of `receiver_id` / `room_id` is expected to be set.
    pub fn insert_chat_message(
        &self,
        sender_id: &str,
        receiver_id: Option<&str>,
        room_id: Option<&str>,
        content: &str,
        message_type: MessageType,
    ) -> DbResult<ChatMessage> {
        let message = ChatMessage {
            id: Uuid::new_v4().to_string(),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.map(str::to_string),
            room_id: room_id.map(str::to_string),
            content: content.to_string(),
            message_type,
            created_at: Utc::now(),
        };

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO chat_messages (id, sender_id, receiver_id, room_id, content, message_type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                &message.id,
                &message.sender_id,
                &message.receiver_id,
                &message.room_id,
                &message.content,
                message.message_type.as_str(),
                timestamp(&message.created_at),
            ],
        )?;

        Ok(message)
    }

    /// Conversation between two users: the latest `limit` messages before
    /// `cursor` (if given), returned oldest first.
    pub fn get_direct_messages(
        &self,
        user_a: &str,
        user_b: &str,
        limit: u32,
        cursor: Option<&HistoryCursor>,
    ) -> DbResult<Vec<ChatMessage>> {
        let conn = self.conn()?;
        let (before, before_id) = cursor_params(cursor);
        let mut stmt = conn.prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM chat_messages
             WHERE ((sender_id = ?1 AND receiver_id = ?2) OR (sender_id = ?2 AND receiver_id = ?1))
               AND {}
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?5",
            before_cursor(3)
        ))?;
        let rows = stmt.query_map(
            rusqlite::params![user_a, user_b, before, before_id, limit],
            Self::row_to_chat_message,
        )?;
        let mut messages = rows.collect::<Result<Vec<_>, _>>()?;
        messages.reverse();
        Ok(messages)
    }

    /// Room history, same paging rules as direct messages.
    pub fn get_room_messages(
        &self,
        room_id: &str,
        limit: u32,
        cursor: Option<&HistoryCursor>,
    ) -> DbResult<Vec<ChatMessage>> {
        let conn = self.conn()?;
        let (before, before_id) = cursor_params(cursor);
        let mut stmt = conn.prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM chat_messages
             WHERE room_id = ?1 AND {}
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?4",
            before_cursor(2)
        ))?;
        let rows = stmt.query_map(
            rusqlite::params![room_id, before, before_id, limit],
            Self::row_to_chat_message,
        )?;
        let mut messages = rows.collect::<Result<Vec<_>, _>>()?;
        messages.reverse();
        Ok(messages)
    }

    fn row_to_chat_message(row: &rusqlite::Row) -> rusqlite::Result<ChatMessage> {
        let message_type: String = row.get(5)?;
        let created_at: String = row.get(6)?;
        Ok(ChatMessage {
            id: row.get(0)?,
            sender_id: row.get(1)?,
            receiver_id: row.get(2)?,
            room_id: row.get(3)?,
            content: row.get(4)?,
            message_type: MessageType::from_str(&message_type).ok_or_else(|| unknown_variant(5, &message_type))?,
            created_at: parse_timestamp(6, &created_at)?,
        })
    }
}
