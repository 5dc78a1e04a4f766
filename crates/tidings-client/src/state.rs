//! The client facade.
//!
//! [`ChatClient`] owns the store handle and the HTTP collaborators for the
//! lifetime of the process, and a [`SignedIn`] bundle for the lifetime of a
//! session. Signing out drops the bundle, which releases every live
//! subscription.

use std::sync::Arc;

use tracing::info;

use tidings_shared::{ChatError, ChatId, MessageId, Result, UserId};
use tidings_store::{Database, MembershipRequest, Message, User};

use crate::commands::{accounts, not_found_as, MutationDispatcher};
use crate::config::ClientConfig;
use crate::fanout::NotificationFanout;
use crate::media::MediaIngest;
use crate::overlay::OverlayState;
use crate::session::Session;
use crate::sync::{ChatIndexSync, LiveSubscription, MessageStreamSync};

/// Everything that exists only while a user is signed in.
pub struct SignedIn {
    pub dispatcher: MutationDispatcher,
    pub chat_index: ChatIndexSync,
    pub messages: MessageStreamSync,
    pub overlay: OverlayState,
}

pub struct ChatClient {
    db: Arc<Database>,
    config: ClientConfig,
    media: Arc<MediaIngest>,
    fanout: Option<Arc<NotificationFanout>>,
    signed_in: Option<SignedIn>,
}

impl ChatClient {
    /// Build a client over an already opened store.
    pub fn new(db: Arc<Database>, config: ClientConfig) -> Result<Self> {
        let http = config.http_client().map_err(ChatError::transport)?;
        let media = Arc::new(MediaIngest::new(http.clone(), &config));
        let fanout = config
            .notify_url
            .as_deref()
            .map(|url| Arc::new(NotificationFanout::new(db.clone(), http, url)));
        if fanout.is_none() {
            info!("TIDINGS_NOTIFY_URL not set; notifications disabled");
        }

        Ok(Self {
            db,
            config,
            media,
            fanout,
            signed_in: None,
        })
    }

    /// Open the store named by `config` (or the platform default) and build
    /// a client over it.
    pub fn open(config: ClientConfig) -> Result<Self> {
        let db = match &config.db_path {
            Some(path) => Database::open_at(path)?,
            None => Database::open_default()?,
        };
        if let Some(path) = db.path() {
            info!(path = %path.display(), "Store opened");
        }
        Self::new(Arc::new(db), config)
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------

    /// Start a session for `user_id` and subscribe to their chat list.
    ///
    /// Any previous session is signed out first.
    pub fn sign_in(&mut self, user_id: UserId) -> Result<&Session> {
        let user = self
            .db
            .get_user(user_id)
            .map_err(|e| not_found_as(e, format!("user {user_id}")))?;
        if !user.is_approved {
            return Err(ChatError::authorization("account is awaiting approval"));
        }
        self.sign_out();

        let session = Session::new(&user);
        let mut chat_index = ChatIndexSync::new(self.db.clone());
        chat_index.subscribe(&session)?;

        let signed_in = self.signed_in.insert(SignedIn {
            dispatcher: MutationDispatcher::new(
                self.db.clone(),
                session,
                self.media.clone(),
                self.fanout.clone(),
                self.config.notification_title.clone(),
            ),
            chat_index,
            messages: MessageStreamSync::new(self.db.clone()),
            overlay: OverlayState::new(),
        });

        info!(user = %user_id.short(), "Signed in");
        Ok(signed_in.dispatcher.session())
    }

    /// End the session, releasing every subscription. Idempotent.
    pub fn sign_out(&mut self) {
        if let Some(mut signed_in) = self.signed_in.take() {
            signed_in.messages.close();
            signed_in.chat_index.unsubscribe();
            info!(user = %signed_in.dispatcher.session().user_id().short(), "Signed out");
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.signed_in.as_ref().map(|s| s.dispatcher.session())
    }

    pub fn signed_in(&self) -> Result<&SignedIn> {
        self.signed_in.as_ref().ok_or_else(not_signed_in)
    }

    pub fn signed_in_mut(&mut self) -> Result<&mut SignedIn> {
        self.signed_in.as_mut().ok_or_else(not_signed_in)
    }

    pub fn dispatcher(&self) -> Result<&MutationDispatcher> {
        Ok(&self.signed_in()?.dispatcher)
    }

    pub fn chat_index(&mut self) -> Result<&mut ChatIndexSync> {
        Ok(&mut self.signed_in_mut()?.chat_index)
    }

    pub fn overlay(&mut self) -> Result<&mut OverlayState> {
        Ok(&mut self.signed_in_mut()?.overlay)
    }

    // ------------------------------------------------------------------
    // Open chat
    // ------------------------------------------------------------------

    /// Make `chat_id` the open chat and subscribe to its messages. Members
    /// and admins only.
    pub fn open_chat(&mut self, chat_id: ChatId) -> Result<&mut LiveSubscription<Vec<Message>>> {
        let db = self.db.clone();
        let signed_in = self.signed_in_mut()?;
        let user_id = signed_in.dispatcher.session().user_id();

        let actor = db
            .get_user(user_id)
            .map_err(|_| ChatError::authorization("signed-in user no longer exists"))?;
        let chat = db
            .get_chat(chat_id)
            .map_err(|e| not_found_as(e, format!("chat {chat_id}")))?;
        if !chat.has_member(user_id) && !actor.is_admin() {
            return Err(ChatError::authorization("not a member of this chat"));
        }

        signed_in.overlay.dismiss();
        signed_in.messages.open(chat_id)
    }

    pub fn close_chat(&mut self) {
        if let Some(signed_in) = self.signed_in.as_mut() {
            signed_in.messages.close();
            signed_in.overlay.dismiss();
        }
    }

    pub fn open_chat_id(&self) -> Option<ChatId> {
        self.signed_in
            .as_ref()
            .and_then(|s| s.messages.active_chat())
    }

    /// Open the context menu for a stored message as the signed-in user.
    pub fn open_message_menu(&mut self, message_id: MessageId) -> Result<()> {
        let db = self.db.clone();
        let signed_in = self.signed_in_mut()?;
        let actor = db
            .get_user(signed_in.dispatcher.session().user_id())
            .map_err(|_| ChatError::authorization("signed-in user no longer exists"))?;
        let message = db
            .get_message(message_id)
            .map_err(|e| not_found_as(e, format!("message {message_id}")))?;
        signed_in.overlay.open_message_menu(&actor, &message)
    }

    // ------------------------------------------------------------------
    // Unauthenticated
    // ------------------------------------------------------------------

    pub fn register_user(&self, email: &str, display_name: Option<&str>) -> Result<User> {
        accounts::register_user(&self.db, email, display_name)
    }

    pub fn submit_password_reset(&self, email: &str) -> Result<MembershipRequest> {
        accounts::submit_password_reset(&self.db, email)
    }
}

fn not_signed_in() -> ChatError {
    ChatError::authorization("not signed in")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::stored_user;
    use tidings_shared::{MessageContent, Role};

    fn client() -> ChatClient {
        let db = Arc::new(Database::open_in_memory().unwrap());
        ChatClient::new(db, ClientConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn open_uses_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tidings.db");
        let config = ClientConfig {
            db_path: Some(path.clone()),
            ..ClientConfig::default()
        };

        let client = ChatClient::open(config.clone()).unwrap();
        let carol = client.register_user("carol@gmail.com", None).unwrap();
        drop(client);

        let reopened = ChatClient::open(config).unwrap();
        assert_eq!(reopened.database().get_user(carol.id).unwrap(), carol);
        assert!(path.exists());
        assert!(reopened.database().path().is_some());
    }

    #[tokio::test]
    async fn sign_in_requires_approval() {
        let mut client = client();
        let pending = client.register_user("carol@gmail.com", None).unwrap();

        assert!(matches!(
            client.sign_in(UserId::new()),
            Err(ChatError::NotFound(_))
        ));
        assert!(matches!(
            client.sign_in(pending.id),
            Err(ChatError::Authorization(_))
        ));
        assert!(client.session().is_none());
        assert!(matches!(client.dispatcher(), Err(ChatError::Authorization(_))));
    }

    #[tokio::test]
    async fn sign_in_subscribes_and_sign_out_releases() {
        let mut client = client();
        let a = stored_user(client.database(), "a@gmail.com", Role::Member);

        client.sign_in(a.id).unwrap();
        assert_eq!(client.session().unwrap().user_id(), a.id);
        assert!(client.chat_index().unwrap().is_subscribed());

        client.sign_out();
        assert!(client.session().is_none());
        assert!(client.chat_index().is_err());
        client.sign_out();
    }

    #[tokio::test]
    async fn outsiders_cannot_open_a_chat() {
        let mut client = client();
        let db = client.database().clone();
        let a = stored_user(&db, "a@gmail.com", Role::Member);
        stored_user(&db, "b@gmail.com", Role::Member);
        let c = stored_user(&db, "c@gmail.com", Role::Member);

        client.sign_in(a.id).unwrap();
        let chat = client
            .dispatcher()
            .unwrap()
            .create_direct_chat("b@gmail.com")
            .await
            .unwrap();
        client
            .dispatcher()
            .unwrap()
            .send_message(chat.id, MessageContent::text("hi"))
            .await
            .unwrap();
        let sub = client.open_chat(chat.id).unwrap();
        assert_eq!(sub.current().len(), 1);
        assert_eq!(client.open_chat_id(), Some(chat.id));

        client.sign_in(c.id).unwrap();
        assert_eq!(client.open_chat_id(), None);
        assert!(matches!(
            client.open_chat(chat.id),
            Err(ChatError::Authorization(_))
        ));
    }

    #[tokio::test]
    async fn message_menu_checks_the_stored_message() {
        let mut client = client();
        let db = client.database().clone();
        let a = stored_user(&db, "a@gmail.com", Role::Member);
        let b = stored_user(&db, "b@gmail.com", Role::Member);

        client.sign_in(a.id).unwrap();
        let chat = client
            .dispatcher()
            .unwrap()
            .create_direct_chat("b@gmail.com")
            .await
            .unwrap();
        let msg = client
            .dispatcher()
            .unwrap()
            .send_message(chat.id, MessageContent::text("hi"))
            .await
            .unwrap();
        client.open_message_menu(msg.id).unwrap();
        assert_eq!(client.overlay().unwrap().begin_edit(), Some(msg.id));

        client.sign_in(b.id).unwrap();
        assert!(matches!(
            client.open_message_menu(msg.id),
            Err(ChatError::Authorization(_))
        ));
        assert!(matches!(
            client.open_message_menu(MessageId::new()),
            Err(ChatError::NotFound(_))
        ));
    }
}
