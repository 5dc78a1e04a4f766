//! Live list of the chats visible to the signed-in user.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use tidings_shared::constants::UNKNOWN_CONTACT;
use tidings_shared::Result;
use tidings_store::{Chat, Database, StoreChange};

use crate::session::Session;
use crate::sync::subscription::LiveSubscription;

/// A chat plus the display fields derived for one viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatView {
    pub chat: Chat,
    pub display_name: String,
    /// Counterpart's contact for direct chats.
    pub display_contact: Option<String>,
}

impl ChatView {
    /// Derive display fields for `viewer_contact`.
    ///
    /// Groups show their name. Direct chats show the counterpart's contact:
    /// the entry of `member_contacts` that is not the viewer's.
    pub fn derive(chat: Chat, viewer_contact: &str) -> Self {
        if chat.is_group {
            let display_name = chat.group_name.clone().unwrap_or_default();
            return Self {
                chat,
                display_name,
                display_contact: None,
            };
        }

        let counterpart = chat
            .member_contacts
            .iter()
            .find(|c| c.as_str() != viewer_contact)
            .cloned();
        Self {
            display_name: counterpart
                .clone()
                .unwrap_or_else(|| UNKNOWN_CONTACT.to_string()),
            display_contact: counterpart,
            chat,
        }
    }
}

/// Case-insensitive substring search on the derived display name.
pub fn filter_chats(views: &[ChatView], query: &str) -> Vec<ChatView> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return views.to_vec();
    }
    views
        .iter()
        .filter(|v| v.display_name.to_lowercase().contains(&query))
        .cloned()
        .collect()
}

/// Owner of the chat-list subscription for one signed-in user.
pub struct ChatIndexSync {
    db: Arc<Database>,
    active: Option<LiveSubscription<Vec<ChatView>>>,
}

impl ChatIndexSync {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db, active: None }
    }

    /// Start (or restart) the subscription for `session`'s user, releasing
    /// any previous one first.
    pub fn subscribe(&mut self, session: &Session) -> Result<&mut LiveSubscription<Vec<ChatView>>> {
        self.unsubscribe();

        let user = session.user_id();
        let viewer = session.contact().to_string();
        let sub = LiveSubscription::spawn(
            self.db.clone(),
            "chat-index",
            |change| matches!(change, StoreChange::Chats),
            move |db| {
                Ok(db
                    .chats_for_member(user)?
                    .into_iter()
                    .map(|chat| ChatView::derive(chat, &viewer))
                    .collect())
            },
        )?;

        info!(user = %user, "chat index subscribed");
        Ok(self.active.insert(sub))
    }

    /// Release the subscription. Idempotent.
    pub fn unsubscribe(&mut self) {
        if let Some(mut sub) = self.active.take() {
            sub.unsubscribe();
            info!("chat index released");
        }
    }

    pub fn subscription(&mut self) -> Option<&mut LiveSubscription<Vec<ChatView>>> {
        self.active.as_mut()
    }

    /// Latest chat list, or empty when not subscribed.
    pub fn snapshot(&self) -> Vec<ChatView> {
        self.active.as_ref().map(|s| s.current()).unwrap_or_default()
    }

    /// Whether a subscription is held and its refresh task is still running.
    pub fn is_subscribed(&self) -> bool {
        self.active.as_ref().is_some_and(|s| s.is_active())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tidings_shared::{ChatId, UserId};

    fn chat(contacts: &[&str], group_name: Option<&str>) -> Chat {
        Chat {
            id: ChatId::new(),
            members: contacts.iter().map(|_| UserId::new()).collect(),
            member_contacts: contacts.iter().map(|c| c.to_string()).collect(),
            is_group: group_name.is_some(),
            group_name: group_name.map(String::from),
            created_by: UserId::new(),
            last_message: None,
            last_message_time: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn direct_chat_shows_counterpart() {
        let view = ChatView::derive(chat(&["a@gmail.com", "b@gmail.com"], None), "b@gmail.com");
        assert_eq!(view.display_name, "a@gmail.com");
        assert_eq!(view.display_contact.as_deref(), Some("a@gmail.com"));
    }

    #[test]
    fn group_shows_its_name() {
        let view = ChatView::derive(
            chat(&["a@gmail.com", "b@gmail.com"], Some("Family")),
            "a@gmail.com",
        );
        assert_eq!(view.display_name, "Family");
        assert!(view.display_contact.is_none());
    }

    #[test]
    fn degenerate_direct_chat_is_unknown() {
        let view = ChatView::derive(chat(&["a@gmail.com"], None), "a@gmail.com");
        assert_eq!(view.display_name, UNKNOWN_CONTACT);
    }

    #[test]
    fn filter_matches_case_insensitively() {
        let views = vec![
            ChatView::derive(chat(&["a@x.com"], Some("Family")), "a@x.com"),
            ChatView::derive(chat(&["a@x.com", "bob@x.com"], None), "a@x.com"),
        ];
        let found = filter_chats(&views, "FAM");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].display_name, "Family");
        assert_eq!(filter_chats(&views, "  ").len(), 2);
    }

    #[tokio::test]
    async fn released_subscription_is_not_reported_active() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let me = crate::testing::stored_user(&db, "a@gmail.com", tidings_shared::Role::Member);
        let mut index = ChatIndexSync::new(db);
        assert!(!index.is_subscribed());

        index.subscribe(&Session::new(&me)).unwrap();
        assert!(index.is_subscribed());

        // released through the handle rather than the owner
        index.subscription().unwrap().unsubscribe();
        assert!(!index.is_subscribed());

        index.unsubscribe();
        assert!(!index.is_subscribed());
    }
}
