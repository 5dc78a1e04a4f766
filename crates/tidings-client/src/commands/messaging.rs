use bytes::Bytes;
use tracing::{info, warn};

use tidings_shared::constants::FALLBACK_SENDER_NAME;
use tidings_shared::types::email_local_part;
use tidings_shared::{ChatError, ChatId, MediaKind, MessageContent, MessageId, Result, ValidationError};
use tidings_store::{Chat, Message, NewMessage, User};

use crate::authz;
use crate::commands::MutationDispatcher;

/// Name recorded on a message at send time.
pub fn sender_display_name(user: &User) -> String {
    if let Some(name) = user.display_name.as_deref().map(str::trim) {
        if !name.is_empty() {
            return name.to_string();
        }
    }
    match email_local_part(&user.email) {
        "" => FALLBACK_SENDER_NAME.to_string(),
        local => local.to_string(),
    }
}

impl MutationDispatcher {
    /// Send `content` to `chat_id` as the signed-in user.
    ///
    /// On success the chat's members are notified in the background;
    /// notification failures never reach the caller.
    pub async fn send_message(&self, chat_id: ChatId, content: MessageContent) -> Result<Message> {
        content.validate()?;
        let actor = self.actor()?;
        let chat = self.chat(chat_id)?;
        if !chat.has_member(actor.id) {
            return Err(ChatError::authorization("not a member of this chat"));
        }

        let message = self.commit_send(
            &chat,
            NewMessage {
                chat_id,
                sender_id: actor.id,
                sender_display_name: sender_display_name(&actor),
                content,
            },
        )?;

        info!(msg_id = %message.id, chat = %chat_id, kind = message.content.kind(), "Message sent");

        self.spawn_fanout(&message);
        Ok(message)
    }

    /// Upload `blob` and send it as a media message.
    ///
    /// Membership is checked before the upload so a rejected send never
    /// leaves an orphaned blob behind.
    pub async fn send_media(
        &self,
        chat_id: ChatId,
        blob: Bytes,
        kind: MediaKind,
        file_name: Option<String>,
    ) -> Result<Message> {
        let actor = self.actor()?;
        let chat = self.chat(chat_id)?;
        if !chat.has_member(actor.id) {
            return Err(ChatError::authorization("not a member of this chat"));
        }

        let media_ref = self.media.upload(blob, kind, file_name.as_deref()).await?;
        self.send_message(chat_id, MessageContent::media(kind, media_ref, file_name))
            .await
    }

    /// Send the signed-in user's position as a location message.
    pub async fn send_location(&self, chat_id: ChatId, latitude: f64, longitude: f64) -> Result<Message> {
        self.send_message(chat_id, MessageContent::location(latitude, longitude))
            .await
    }

    /// The two writes of a send: insert the message, then refresh the chat
    /// preview. They are not atomic. If the preview write fails the message
    /// stays stored and the error is surfaced; the preview catches up on the
    /// next successful send. A transactional backend only needs to change
    /// this method.
    fn commit_send(&self, chat: &Chat, new: NewMessage) -> Result<Message> {
        let message = self.db.insert_message(&new)?;

        match self
            .db
            .update_chat_preview(chat.id, &message.content.preview(), message.created_at)
        {
            Ok(true) => Ok(message),
            Ok(false) => {
                warn!(msg_id = %message.id, chat = %chat.id, "chat deleted while sending");
                Err(ChatError::not_found(format!("chat {}", chat.id)))
            }
            Err(e) => {
                warn!(msg_id = %message.id, chat = %chat.id, error = %e, "message stored but chat preview is stale");
                Err(e.into())
            }
        }
    }

    fn spawn_fanout(&self, message: &Message) {
        let Some(fanout) = self.fanout.clone() else {
            return;
        };
        let chat_id = message.chat_id;
        let sender = message.sender_id;
        let title = self.notification_title.clone();
        let body = format!(
            "{}: {}",
            message.sender_display_name,
            message.content.preview()
        );
        tokio::spawn(async move {
            fanout.notify(chat_id, sender, &title, &body).await;
        });
    }

    /// Replace the text of one of the signed-in user's text messages (or any
    /// text message, for an admin).
    pub async fn edit_message(&self, message_id: MessageId, new_text: &str) -> Result<Message> {
        if new_text.trim().is_empty() {
            return Err(ValidationError::EmptyContent.into());
        }
        let actor = self.actor()?;
        let message = self.message(message_id)?;
        if !authz::can_mutate_message(&actor, &message) {
            return Err(ChatError::authorization("only the sender or an admin may edit"));
        }
        if !message.content.is_text() {
            return Err(ValidationError::NotEditable.into());
        }

        if !self.db.update_message_text(message_id, new_text)? {
            return Err(ChatError::not_found(format!("message {message_id}")));
        }

        info!(msg_id = %message_id, "Message edited");
        self.message(message_id)
    }

    /// Hard-delete a message.
    pub async fn delete_message(&self, message_id: MessageId) -> Result<()> {
        let actor = self.actor()?;
        let message = self.message(message_id)?;
        if !authz::can_mutate_message(&actor, &message) {
            return Err(ChatError::authorization("only the sender or an admin may delete"));
        }

        if !self.db.delete_message(message_id)? {
            return Err(ChatError::not_found(format!("message {message_id}")));
        }

        info!(msg_id = %message_id, chat = %message.chat_id, "Message deleted");
        Ok(())
    }
}
