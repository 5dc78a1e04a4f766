//! Test fixtures shared by the CRUD modules.

use tidings_shared::{ChatId, MessageContent, Role, UserId};

use crate::database::Database;
use crate::models::{Chat, NewChat, NewMessage, User};

pub(crate) fn stored_user(db: &Database, email: &str) -> User {
    let user = User {
        id: UserId::new(),
        email: email.to_string(),
        display_name: None,
        avatar_ref: None,
        role: Role::Member,
        is_approved: true,
        push_token: None,
        location: None,
        created_at: db.next_timestamp().unwrap(),
    };
    db.insert_user(&user).unwrap();
    user
}

pub(crate) fn direct_chat(db: &Database, a: &User, b: &User) -> Chat {
    db.insert_chat(&NewChat {
        members: vec![(a.id, a.email.clone()), (b.id, b.email.clone())],
        is_group: false,
        group_name: None,
        created_by: a.id,
        last_message: None,
    })
    .unwrap()
}

pub(crate) fn sample_message(chat_id: ChatId, sender: &User, text: &str) -> NewMessage {
    NewMessage {
        chat_id,
        sender_id: sender.id,
        sender_display_name: sender.email.clone(),
        content: MessageContent::text(text),
    }
}
