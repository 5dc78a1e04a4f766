use rusqlite::params;
use rusqlite::types::Type;
use tidings_shared::{ChatId, MessageContent, MessageId, UserId};

use crate::changes::StoreChange;
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Message, NewMessage};
use crate::sql::{not_found, ts_from_sql, ts_to_sql, uuid_from_sql};

const MESSAGE_COLUMNS: &str = "id, chat_id, sender_id, sender_name, kind, text, media_ref, file_name,
     latitude, longitude, created_at, edited";

impl Database {
    /// Insert a message, assigning its id and `created_at`.
    pub fn insert_message(&self, new: &NewMessage) -> Result<Message> {
        let id = MessageId::new();
        let created_at = self.next_timestamp()?;

        let (text, media_ref, file_name, latitude, longitude) = match &new.content {
            MessageContent::Text { text } => (Some(text.as_str()), None, None, None, None),
            MessageContent::Image { media_ref } | MessageContent::Audio { media_ref } => {
                (None, Some(media_ref.as_str()), None, None, None)
            }
            MessageContent::File {
                media_ref,
                file_name,
            } => (None, Some(media_ref.as_str()), file_name.as_deref(), None, None),
            MessageContent::Location {
                map_ref,
                latitude,
                longitude,
            } => (None, Some(map_ref.as_str()), None, Some(*latitude), Some(*longitude)),
        };

        self.conn()?.execute(
            "INSERT INTO messages (id, chat_id, sender_id, sender_name, kind, text, media_ref,
                                   file_name, latitude, longitude, created_at, edited)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0)",
            params![
                id.to_string(),
                new.chat_id.to_string(),
                new.sender_id.to_string(),
                new.sender_display_name,
                new.content.kind(),
                text,
                media_ref,
                file_name,
                latitude,
                longitude,
                ts_to_sql(&created_at),
            ],
        )?;

        self.publish(StoreChange::Messages {
            chat_id: new.chat_id,
        });

        Ok(Message {
            id,
            chat_id: new.chat_id,
            sender_id: new.sender_id,
            sender_display_name: new.sender_display_name.clone(),
            content: new.content.clone(),
            created_at,
            edited: false,
        })
    }

    /// All messages of a chat in ascending `created_at` order.
    pub fn messages_for_chat(&self, chat_id: ChatId) -> Result<Vec<Message>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {MESSAGE_COLUMNS}
             FROM messages
             WHERE chat_id = ?1
             ORDER BY created_at ASC, rowid ASC"
        ))?;

        let rows = stmt.query_map(params![chat_id.to_string()], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    pub fn get_message(&self, id: MessageId) -> Result<Message> {
        self.conn()?
            .query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
                params![id.to_string()],
                row_to_message,
            )
            .map_err(not_found)
    }

    /// Replace the text of a text message and mark it edited.
    ///
    /// Only `text` and `edited` are touched; non-text rows never match.
    pub fn update_message_text(&self, id: MessageId, text: &str) -> Result<bool> {
        let chat_id = self.message_chat(id)?;
        let affected = self.conn()?.execute(
            "UPDATE messages SET text = ?1, edited = 1 WHERE id = ?2 AND kind = 'text'",
            params![text, id.to_string()],
        )?;
        self.publish_if(affected > 0, StoreChange::Messages { chat_id });
        Ok(affected > 0)
    }

    /// Hard delete. Returns `false` if the message was already gone.
    pub fn delete_message(&self, id: MessageId) -> Result<bool> {
        let chat_id = match self.message_chat(id) {
            Ok(chat_id) => chat_id,
            Err(StoreError::NotFound) => return Ok(false),
            Err(e) => return Err(e),
        };
        let affected = self
            .conn()?
            .execute("DELETE FROM messages WHERE id = ?1", params![id.to_string()])?;
        self.publish_if(affected > 0, StoreChange::Messages { chat_id });
        Ok(affected > 0)
    }

    fn message_chat(&self, id: MessageId) -> Result<ChatId> {
        let chat_str: String = self
            .conn()?
            .query_row(
                "SELECT chat_id FROM messages WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .map_err(not_found)?;
        Ok(ChatId(uuid::Uuid::parse_str(&chat_str)?))
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let id_str: String = row.get(0)?;
    let chat_id_str: String = row.get(1)?;
    let sender_str: String = row.get(2)?;
    let kind: String = row.get(4)?;
    let text: Option<String> = row.get(5)?;
    let media_ref: Option<String> = row.get(6)?;
    let file_name: Option<String> = row.get(7)?;
    let latitude: Option<f64> = row.get(8)?;
    let longitude: Option<f64> = row.get(9)?;
    let ts_str: String = row.get(10)?;

    let content = match kind.as_str() {
        "text" => MessageContent::Text {
            text: text.unwrap_or_default(),
        },
        "image" => MessageContent::Image {
            media_ref: media_ref.unwrap_or_default(),
        },
        "audio" => MessageContent::Audio {
            media_ref: media_ref.unwrap_or_default(),
        },
        "file" => MessageContent::File {
            media_ref: media_ref.unwrap_or_default(),
            file_name,
        },
        "location" => MessageContent::Location {
            map_ref: media_ref.unwrap_or_default(),
            latitude: latitude.unwrap_or_default(),
            longitude: longitude.unwrap_or_default(),
        },
        other => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                4,
                Type::Text,
                format!("unknown message kind {other:?}").into(),
            ))
        }
    };

    Ok(Message {
        id: MessageId(uuid_from_sql(0, &id_str)?),
        chat_id: ChatId(uuid_from_sql(1, &chat_id_str)?),
        sender_id: UserId(uuid_from_sql(2, &sender_str)?),
        sender_display_name: row.get(3)?,
        content,
        created_at: ts_from_sql(10, &ts_str)?,
        edited: row.get(11)?,
    })
}
