//! Shared fixtures for the unit tests in this crate.

use std::sync::Arc;

use tidings_shared::{Role, UserId};
use tidings_store::{Chat, Database, NewChat, User};

use crate::commands::MutationDispatcher;
use crate::config::ClientConfig;
use crate::media::MediaIngest;
use crate::session::Session;

pub(crate) struct Harness {
    pub db: Arc<Database>,
    media: Arc<MediaIngest>,
}

pub(crate) fn harness() -> Harness {
    let config = ClientConfig::default();
    Harness {
        db: Arc::new(Database::open_in_memory().unwrap()),
        media: Arc::new(MediaIngest::new(reqwest::Client::new(), &config)),
    }
}

/// An approved user with the given role.
pub(crate) fn stored_user(db: &Database, email: &str, role: Role) -> User {
    let user = User {
        id: UserId::new(),
        email: email.to_string(),
        display_name: None,
        avatar_ref: None,
        role,
        is_approved: true,
        push_token: None,
        location: None,
        created_at: db.next_timestamp().unwrap(),
    };
    db.insert_user(&user).unwrap();
    user
}

impl Harness {
    /// A dispatcher acting as `user`, without notification fanout.
    pub fn dispatcher(&self, user: &User) -> MutationDispatcher {
        MutationDispatcher::new(
            self.db.clone(),
            Session::new(user),
            self.media.clone(),
            None,
            "Tidings".to_string(),
        )
    }

    pub fn direct_chat(&self, a: &User, b: &User) -> Chat {
        self.db
            .insert_chat(&NewChat {
                members: vec![(a.id, a.email.clone()), (b.id, b.email.clone())],
                is_group: false,
                group_name: None,
                created_by: a.id,
                last_message: None,
            })
            .unwrap()
    }
}
