//! Live, ordered message list for the open chat.
//!
//! At most one chat is open at a time; opening another releases the
//! previous subscription first so no snapshot of the old chat can arrive
//! after the switch.

use std::sync::Arc;

use tracing::info;

use tidings_shared::{ChatId, Result};
use tidings_store::{Database, Message, StoreChange};

use crate::sync::subscription::LiveSubscription;

pub struct MessageStreamSync {
    db: Arc<Database>,
    active: Option<(ChatId, LiveSubscription<Vec<Message>>)>,
}

impl MessageStreamSync {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db, active: None }
    }

    /// Subscribe to `chat_id`'s messages in ascending `created_at` order.
    pub fn open(&mut self, chat_id: ChatId) -> Result<&mut LiveSubscription<Vec<Message>>> {
        self.close();

        let sub = LiveSubscription::spawn(
            self.db.clone(),
            "message-stream",
            move |change| matches!(change, StoreChange::Messages { chat_id: c } if *c == chat_id),
            move |db| Ok(db.messages_for_chat(chat_id)?),
        )?;

        info!(chat = %chat_id, "message stream opened");
        let (_, sub) = self.active.insert((chat_id, sub));
        Ok(sub)
    }

    /// Release the open chat's subscription. Idempotent.
    pub fn close(&mut self) {
        if let Some((chat_id, mut sub)) = self.active.take() {
            sub.unsubscribe();
            info!(chat = %chat_id, "message stream closed");
        }
    }

    pub fn active_chat(&self) -> Option<ChatId> {
        self.active.as_ref().map(|(id, _)| *id)
    }

    pub fn subscription(&mut self) -> Option<&mut LiveSubscription<Vec<Message>>> {
        self.active.as_mut().map(|(_, sub)| sub)
    }

    /// Latest messages of the open chat, or empty when none is open.
    pub fn snapshot(&self) -> Vec<Message> {
        self.active
            .as_ref()
            .map(|(_, s)| s.current())
            .unwrap_or_default()
    }
}
