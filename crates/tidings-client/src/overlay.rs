//! Context-menu state.
//!
//! At most one menu is open at a time. Opening one closes the other, and
//! any click outside a menu is reported as [`OverlayState::dismiss`].

use serde::Serialize;
use tracing::debug;

use tidings_shared::{ChatError, ChatId, MessageId, Result};
use tidings_store::{Message, User};

use crate::authz;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum Overlay {
    #[default]
    None,
    #[serde(rename_all = "camelCase")]
    MessageMenu {
        message_id: MessageId,
        kind: &'static str,
    },
    #[serde(rename_all = "camelCase")]
    ChatMenu { chat_id: ChatId },
}

#[derive(Debug, Default)]
pub struct OverlayState {
    current: Overlay,
}

impl OverlayState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Overlay {
        self.current
    }

    /// Open the edit/delete menu for `message`. Only the sender or an admin
    /// gets one; anyone else leaves every menu closed.
    pub fn open_message_menu(&mut self, actor: &User, message: &Message) -> Result<()> {
        if !authz::can_mutate_message(actor, message) {
            self.current = Overlay::None;
            return Err(ChatError::authorization(
                "only the sender or an admin may act on this message",
            ));
        }
        self.current = Overlay::MessageMenu {
            message_id: message.id,
            kind: message.content.kind(),
        };
        debug!(msg_id = %message.id, "message menu opened");
        Ok(())
    }

    pub fn open_chat_menu(&mut self, chat_id: ChatId) {
        self.current = Overlay::ChatMenu { chat_id };
    }

    pub fn dismiss(&mut self) {
        self.current = Overlay::None;
    }

    /// Leave the message menu to edit its message. Only text messages can
    /// be edited; for anything else the menu stays open.
    pub fn begin_edit(&mut self) -> Option<MessageId> {
        match self.current {
            Overlay::MessageMenu { message_id, kind } if kind == "text" => {
                self.current = Overlay::None;
                Some(message_id)
            }
            _ => None,
        }
    }

    /// Leave the message menu, returning the message to delete.
    pub fn take_message_target(&mut self) -> Option<MessageId> {
        match self.current {
            Overlay::MessageMenu { message_id, .. } => {
                self.current = Overlay::None;
                Some(message_id)
            }
            _ => None,
        }
    }

    /// Leave the chat menu, returning the chat to clear or delete.
    pub fn take_chat_target(&mut self) -> Option<ChatId> {
        match self.current {
            Overlay::ChatMenu { chat_id } => {
                self.current = Overlay::None;
                Some(chat_id)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tidings_shared::{MessageContent, Role, UserId};

    fn user(role: Role) -> User {
        User {
            id: UserId::new(),
            email: "x@gmail.com".into(),
            display_name: None,
            avatar_ref: None,
            role,
            is_approved: true,
            push_token: None,
            location: None,
            created_at: Utc::now(),
        }
    }

    fn message_from(sender: &User, content: MessageContent) -> Message {
        Message {
            id: MessageId::new(),
            chat_id: ChatId::new(),
            sender_id: sender.id,
            sender_display_name: "x".into(),
            content,
            created_at: Utc::now(),
            edited: false,
        }
    }

    #[test]
    fn menus_are_mutually_exclusive() {
        let me = user(Role::Member);
        let msg = message_from(&me, MessageContent::text("hi"));
        let chat = ChatId::new();
        let mut overlay = OverlayState::new();

        overlay.open_chat_menu(chat);
        overlay.open_message_menu(&me, &msg).unwrap();
        assert!(matches!(overlay.current(), Overlay::MessageMenu { .. }));

        overlay.open_chat_menu(chat);
        assert_eq!(overlay.current(), Overlay::ChatMenu { chat_id: chat });

        overlay.dismiss();
        assert_eq!(overlay.current(), Overlay::None);
    }

    #[test]
    fn others_cannot_open_a_message_menu() {
        let sender = user(Role::Member);
        let other = user(Role::Member);
        let admin = user(Role::Admin);
        let msg = message_from(&sender, MessageContent::text("hi"));
        let mut overlay = OverlayState::new();

        overlay.open_chat_menu(ChatId::new());
        assert!(matches!(
            overlay.open_message_menu(&other, &msg),
            Err(ChatError::Authorization(_))
        ));
        assert_eq!(overlay.current(), Overlay::None);

        overlay.open_message_menu(&admin, &msg).unwrap();
        assert_eq!(overlay.take_message_target(), Some(msg.id));
    }

    #[test]
    fn only_text_messages_can_be_edited() {
        let me = user(Role::Member);
        let text = message_from(&me, MessageContent::text("hi"));
        let place = message_from(&me, MessageContent::location(1.0, 2.0));
        let mut overlay = OverlayState::new();

        overlay.open_message_menu(&me, &place).unwrap();
        assert_eq!(overlay.begin_edit(), None);
        assert!(matches!(overlay.current(), Overlay::MessageMenu { .. }));

        overlay.open_message_menu(&me, &text).unwrap();
        assert_eq!(overlay.begin_edit(), Some(text.id));
        assert_eq!(overlay.current(), Overlay::None);
    }

    #[test]
    fn chat_target_is_taken_once() {
        let chat = ChatId::new();
        let mut overlay = OverlayState::new();
        assert_eq!(overlay.take_chat_target(), None);

        overlay.open_chat_menu(chat);
        assert_eq!(overlay.take_chat_target(), Some(chat));
        assert_eq!(overlay.take_chat_target(), None);
    }
}
