//! Mutation dispatch.
//!
//! [`MutationDispatcher`] performs every write the signed-in user can issue.
//! Each operation validates its input and asks [`crate::authz`] before the
//! first write; rejected calls leave the store untouched.
//!
//! The operations are split by area the same way the store's CRUD helpers
//! are: messaging, chats and membership, profile, and administration.
//! [`accounts`] holds the few operations that run without a session.

pub mod accounts;
pub mod admin;
pub mod chats;
pub mod messaging;
pub mod profile;

use std::sync::Arc;

use tidings_shared::{ChatError, ChatId, MessageId, Result};
use tidings_store::{Chat, Database, Message, StoreError, User};

use crate::fanout::NotificationFanout;
use crate::media::MediaIngest;
use crate::session::Session;

pub struct MutationDispatcher {
    db: Arc<Database>,
    session: Session,
    media: Arc<MediaIngest>,
    fanout: Option<Arc<NotificationFanout>>,
    notification_title: String,
}

impl MutationDispatcher {
    pub fn new(
        db: Arc<Database>,
        session: Session,
        media: Arc<MediaIngest>,
        fanout: Option<Arc<NotificationFanout>>,
        notification_title: String,
    ) -> Self {
        Self {
            db,
            session,
            media,
            fanout,
            notification_title,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The signed-in user as currently stored. Re-read on every mutation so
    /// role changes apply immediately.
    fn actor(&self) -> Result<User> {
        self.db
            .get_user(self.session.user_id())
            .map_err(|_| ChatError::authorization("signed-in user no longer exists"))
    }

    fn chat(&self, chat_id: ChatId) -> Result<Chat> {
        self.db
            .get_chat(chat_id)
            .map_err(|e| not_found_as(e, format!("chat {chat_id}")))
    }

    fn message(&self, message_id: MessageId) -> Result<Message> {
        self.db
            .get_message(message_id)
            .map_err(|e| not_found_as(e, format!("message {message_id}")))
    }
}

/// Rename a store `NotFound` after the thing that was looked up.
pub(crate) fn not_found_as(e: StoreError, what: String) -> ChatError {
    match e {
        StoreError::NotFound => ChatError::NotFound(what),
        other => other.into(),
    }
}

/// Contacts are compared trimmed and lowercased.
pub fn normalize_contact(contact: &str) -> String {
    contact.trim().to_lowercase()
}
