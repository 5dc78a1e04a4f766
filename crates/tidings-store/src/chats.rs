//! CRUD operations for [`Chat`] records and their membership rows.
//!
//! Membership is stored as one `chat_members` row per `(user_id, contact)`
//! pair, so the `members` / `member_contacts` views are always the same
//! length and every membership edit is a single-row write.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tidings_shared::{ChatId, UserId};

use crate::changes::StoreChange;
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Chat, NewChat};
use crate::sql::{not_found, ts_from_sql, ts_to_sql, uuid_from_sql};

const CHAT_COLUMNS: &str =
    "c.id, c.is_group, c.group_name, c.created_by, c.last_message, c.last_message_time, c.created_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a chat together with its membership rows in one transaction.
    ///
    /// For a direct chat the uniqueness check runs inside the same
    /// transaction, so two racing creators cannot both succeed.
    pub fn insert_chat(&self, new: &NewChat) -> Result<Chat> {
        let id = ChatId::new();
        let created_at = self.next_timestamp()?;

        {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;
            if let [(a, _), (b, _)] = new.members.as_slice() {
                if !new.is_group {
                    if let Some(existing) = direct_chat_between(&tx, *a, *b)? {
                        return Err(StoreError::DirectChatExists(existing));
                    }
                }
            }
            tx.execute(
                "INSERT INTO chats (id, is_group, group_name, created_by, last_message,
                                    last_message_time, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6)",
                params![
                    id.to_string(),
                    new.is_group,
                    new.group_name,
                    new.created_by.to_string(),
                    new.last_message,
                    ts_to_sql(&created_at),
                ],
            )?;
            for (position, (user_id, contact)) in new.members.iter().enumerate() {
                tx.execute(
                    "INSERT INTO chat_members (chat_id, position, user_id, contact)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![id.to_string(), position as i64, user_id.to_string(), contact],
                )?;
            }
            tx.commit()?;
        }

        self.publish(StoreChange::Chats);

        let (members, member_contacts) = new.members.iter().cloned().unzip();
        Ok(Chat {
            id,
            members,
            member_contacts,
            is_group: new.is_group,
            group_name: new.group_name.clone(),
            created_by: new.created_by,
            last_message: new.last_message.clone(),
            last_message_time: None,
            created_at,
        })
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single chat by id.
    pub fn get_chat(&self, id: ChatId) -> Result<Chat> {
        let conn = self.conn()?;
        let mut chat = conn
            .query_row(
                &format!("SELECT {CHAT_COLUMNS} FROM chats c WHERE c.id = ?1"),
                params![id.to_string()],
                row_to_chat,
            )
            .map_err(not_found)?;
        load_members(&conn, &mut chat)?;
        Ok(chat)
    }

    /// Every chat that lists `user` as a member, most recently active first.
    pub fn chats_for_member(&self, user: UserId) -> Result<Vec<Chat>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {CHAT_COLUMNS}
             FROM chats c
             WHERE EXISTS (
                 SELECT 1 FROM chat_members m WHERE m.chat_id = c.id AND m.user_id = ?1
             )
             ORDER BY COALESCE(c.last_message_time, c.created_at) DESC, c.id ASC"
        ))?;

        let rows = stmt.query_map(params![user.to_string()], row_to_chat)?;

        let mut chats = Vec::new();
        for row in rows {
            let mut chat = row?;
            load_members(&conn, &mut chat)?;
            chats.push(chat);
        }
        Ok(chats)
    }

    /// The direct (non-group) chat whose members are exactly `{a, b}`.
    pub fn find_direct_chat(&self, a: UserId, b: UserId) -> Result<Option<ChatId>> {
        let conn = self.conn()?;
        direct_chat_between(&conn, a, b)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Append a `(user, contact)` pair. Returns `false` if `user` is already
    /// a member.
    pub fn add_chat_member(&self, chat_id: ChatId, user: UserId, contact: &str) -> Result<bool> {
        let affected = self.conn()?.execute(
            "INSERT OR IGNORE INTO chat_members (chat_id, position, user_id, contact)
             SELECT ?1, COALESCE(MAX(position) + 1, 0), ?2, ?3
             FROM chat_members WHERE chat_id = ?1",
            params![chat_id.to_string(), user.to_string(), contact],
        )?;
        self.publish_if(affected > 0, StoreChange::Chats);
        Ok(affected > 0)
    }

    /// Drop the `(user, contact)` pair. Returns `false` if `user` was not a
    /// member.
    pub fn remove_chat_member(&self, chat_id: ChatId, user: UserId) -> Result<bool> {
        let affected = self.conn()?.execute(
            "DELETE FROM chat_members WHERE chat_id = ?1 AND user_id = ?2",
            params![chat_id.to_string(), user.to_string()],
        )?;
        self.publish_if(affected > 0, StoreChange::Chats);
        Ok(affected > 0)
    }

    /// Overwrite the denormalized preview. Last writer wins.
    pub fn update_chat_preview(
        &self,
        chat_id: ChatId,
        last_message: &str,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let affected = self.conn()?.execute(
            "UPDATE chats SET last_message = ?1, last_message_time = ?2 WHERE id = ?3",
            params![last_message, ts_to_sql(&at), chat_id.to_string()],
        )?;
        self.publish_if(affected > 0, StoreChange::Chats);
        Ok(affected > 0)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete every message of the chat and reset its preview, keeping the
    /// chat record. Returns the number of messages removed.
    pub fn clear_chat_messages(&self, chat_id: ChatId) -> Result<usize> {
        let now = self.next_timestamp()?;
        let removed = {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;
            let removed = tx.execute(
                "DELETE FROM messages WHERE chat_id = ?1",
                params![chat_id.to_string()],
            )?;
            let updated = tx.execute(
                "UPDATE chats SET last_message = '', last_message_time = ?1 WHERE id = ?2",
                params![ts_to_sql(&now), chat_id.to_string()],
            )?;
            if updated == 0 {
                return Err(StoreError::NotFound);
            }
            tx.commit()?;
            removed
        };

        self.publish(StoreChange::Messages { chat_id });
        self.publish(StoreChange::Chats);
        Ok(removed)
    }

    /// Delete the chat and everything it owns as one batch.
    ///
    /// Messages go first and the chat record last, so even without the
    /// transaction a partial failure could only leave a visible chat, never
    /// ownerless messages. Returns `false` if the chat did not exist.
    pub fn delete_chat_cascade(&self, chat_id: ChatId) -> Result<bool> {
        let deleted = {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM messages WHERE chat_id = ?1",
                params![chat_id.to_string()],
            )?;
            tx.execute(
                "DELETE FROM chat_members WHERE chat_id = ?1",
                params![chat_id.to_string()],
            )?;
            let deleted = tx.execute(
                "DELETE FROM chats WHERE id = ?1",
                params![chat_id.to_string()],
            )?;
            tx.commit()?;
            deleted > 0
        };

        if deleted {
            self.publish(StoreChange::Messages { chat_id });
            self.publish(StoreChange::Chats);
        }
        Ok(deleted)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn direct_chat_between(conn: &Connection, a: UserId, b: UserId) -> Result<Option<ChatId>> {
    if a == b {
        return Ok(None);
    }
    let id: Option<String> = conn
        .query_row(
            "SELECT c.id FROM chats c
             WHERE c.is_group = 0
               AND EXISTS (SELECT 1 FROM chat_members m WHERE m.chat_id = c.id AND m.user_id = ?1)
               AND EXISTS (SELECT 1 FROM chat_members m WHERE m.chat_id = c.id AND m.user_id = ?2)
               AND (SELECT COUNT(*) FROM chat_members m WHERE m.chat_id = c.id) = 2
             LIMIT 1",
            params![a.to_string(), b.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    let id = id.map(|s| uuid::Uuid::parse_str(&s).map(ChatId)).transpose()?;
    Ok(id)
}

/// Map a `rusqlite::Row` to a [`Chat`] with empty membership.
fn row_to_chat(row: &rusqlite::Row<'_>) -> rusqlite::Result<Chat> {
    let id_str: String = row.get(0)?;
    let created_by_str: String = row.get(3)?;
    let last_time_str: Option<String> = row.get(5)?;
    let created_str: String = row.get(6)?;

    Ok(Chat {
        id: ChatId(uuid_from_sql(0, &id_str)?),
        members: Vec::new(),
        member_contacts: Vec::new(),
        is_group: row.get(1)?,
        group_name: row.get(2)?,
        created_by: UserId(uuid_from_sql(3, &created_by_str)?),
        last_message: row.get(4)?,
        last_message_time: last_time_str
            .map(|s| ts_from_sql(5, &s))
            .transpose()?,
        created_at: ts_from_sql(6, &created_str)?,
    })
}

fn load_members(conn: &Connection, chat: &mut Chat) -> Result<()> {
    let mut stmt = conn.prepare_cached(
        "SELECT user_id, contact FROM chat_members WHERE chat_id = ?1 ORDER BY position ASC",
    )?;
    let rows = stmt.query_map(params![chat.id.to_string()], |row| {
        let user_str: String = row.get(0)?;
        let contact: String = row.get(1)?;
        Ok((UserId(uuid_from_sql(0, &user_str)?), contact))
    })?;

    chat.members.clear();
    chat.member_contacts.clear();
    for row in rows {
        let (user, contact) = row?;
        chat.members.push(user);
        chat.member_contacts.push(contact);
    }
    Ok(())
}
