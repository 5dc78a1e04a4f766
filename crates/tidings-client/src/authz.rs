//! Authorization decisions.
//!
//! Pure functions over store records; no I/O. Callers reject with
//! [`ChatError::Authorization`](tidings_shared::ChatError) before issuing
//! any write.

use tidings_store::{Chat, Message, User};

/// Sender or admin may edit or delete a message.
pub fn can_mutate_message(actor: &User, message: &Message) -> bool {
    actor.id == message.sender_id || actor.is_admin()
}

/// Admin or the chat's creator may change its membership.
pub fn can_mutate_membership(actor: &User, chat: &Chat) -> bool {
    actor.is_admin() || actor.id == chat.created_by
}

/// Who may clear or delete a whole chat.
///
/// Groups follow the membership rule. In a direct chat both participants are
/// peers, so either of them may.
pub fn can_manage_chat(actor: &User, chat: &Chat) -> bool {
    can_mutate_membership(actor, chat) || (!chat.is_group && chat.has_member(actor.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tidings_shared::{ChatId, MessageContent, MessageId, Role, UserId};

    fn user(role: Role) -> User {
        User {
            id: UserId::new(),
            email: "x@example.com".into(),
            display_name: None,
            avatar_ref: None,
            role,
            is_approved: true,
            push_token: None,
            location: None,
            created_at: Utc::now(),
        }
    }

    fn message_from(sender: &User) -> Message {
        Message {
            id: MessageId::new(),
            chat_id: ChatId::new(),
            sender_id: sender.id,
            sender_display_name: "x".into(),
            content: MessageContent::text("hi"),
            created_at: Utc::now(),
            edited: false,
        }
    }

    fn chat(created_by: &User, members: &[&User], is_group: bool) -> Chat {
        Chat {
            id: ChatId::new(),
            members: members.iter().map(|u| u.id).collect(),
            member_contacts: members.iter().map(|u| u.email.clone()).collect(),
            is_group,
            group_name: is_group.then(|| "g".to_string()),
            created_by: created_by.id,
            last_message: None,
            last_message_time: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn sender_and_admin_may_mutate_message() {
        let sender = user(Role::Member);
        let other = user(Role::Member);
        let admin = user(Role::Admin);
        let msg = message_from(&sender);

        assert!(can_mutate_message(&sender, &msg));
        assert!(can_mutate_message(&admin, &msg));
        assert!(!can_mutate_message(&other, &msg));
    }

    #[test]
    fn creator_and_admin_may_mutate_membership() {
        let creator = user(Role::Member);
        let member = user(Role::Member);
        let admin = user(Role::Admin);
        let group = chat(&creator, &[&creator, &member], true);

        assert!(can_mutate_membership(&creator, &group));
        assert!(can_mutate_membership(&admin, &group));
        assert!(!can_mutate_membership(&member, &group));
    }

    #[test]
    fn direct_chat_peers_may_manage_it() {
        let a = user(Role::Member);
        let b = user(Role::Member);
        let outsider = user(Role::Member);
        let direct = chat(&a, &[&a, &b], false);
        let group = chat(&a, &[&a, &b], true);

        assert!(can_manage_chat(&b, &direct));
        assert!(!can_manage_chat(&outsider, &direct));
        assert!(!can_manage_chat(&b, &group));
    }
}
