use tracing::{debug, info};

use tidings_shared::constants::{DIRECT_CHAT_GREETING, GROUP_CHAT_GREETING};
use tidings_shared::{ChatError, ChatId, Result, UserId, ValidationError};
use tidings_store::{Chat, NewChat, StoreError, User};

use crate::authz;
use crate::commands::{normalize_contact, MutationDispatcher};

impl MutationDispatcher {
    /// Open a one-to-one chat with the user registered under
    /// `target_contact`.
    pub async fn create_direct_chat(&self, target_contact: &str) -> Result<Chat> {
        let actor = self.actor()?;
        let contact = normalize_contact(target_contact);
        if contact == normalize_contact(&actor.email) {
            return Err(ValidationError::SelfTarget.into());
        }
        let target = self.resolve_contact(&contact)?;
        if target.id == actor.id {
            return Err(ValidationError::SelfTarget.into());
        }
        if let Some(existing) = self.db.find_direct_chat(actor.id, target.id)? {
            debug!(chat = %existing, "direct chat already exists");
            return Err(ValidationError::DuplicateChat.into());
        }

        let new = NewChat {
            members: vec![(actor.id, actor.email.clone()), (target.id, target.email.clone())],
            is_group: false,
            group_name: None,
            created_by: actor.id,
            last_message: Some(DIRECT_CHAT_GREETING.to_string()),
        };
        let chat = self.db.insert_chat(&new).map_err(|e| match e {
            StoreError::DirectChatExists(existing) => {
                debug!(chat = %existing, "direct chat already exists");
                ChatError::Validation(ValidationError::DuplicateChat)
            }
            other => other.into(),
        })?;

        info!(chat = %chat.id, with = %target.id.short(), "Direct chat created");
        Ok(chat)
    }

    /// Create a named group. Contacts that do not resolve to a registered
    /// user, or that name the creator, are skipped.
    pub async fn create_group(&self, name: &str, contacts: &[String]) -> Result<Chat> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyGroupName.into());
        }
        let actor = self.actor()?;

        let mut members = vec![(actor.id, actor.email.clone())];
        for contact in contacts {
            let contact = normalize_contact(contact);
            match self.db.find_user_by_email(&contact)? {
                Some(user) if !members.iter().any(|(id, _)| *id == user.id) => {
                    members.push((user.id, user.email));
                }
                Some(_) => {}
                None => debug!(contact = %contact, "group member not registered; skipped"),
            }
        }
        if members.len() < 2 {
            return Err(ValidationError::NoGroupMembers.into());
        }

        let chat = self.db.insert_chat(&NewChat {
            members,
            is_group: true,
            group_name: Some(name.to_string()),
            created_by: actor.id,
            last_message: Some(GROUP_CHAT_GREETING.to_string()),
        })?;

        info!(chat = %chat.id, members = chat.members.len(), "Group created");
        Ok(chat)
    }

    /// Add the user registered under `contact` to a group.
    pub async fn add_member(&self, chat_id: ChatId, contact: &str) -> Result<Chat> {
        let actor = self.actor()?;
        let chat = self.chat(chat_id)?;
        self.require_membership_rights(&actor, &chat)?;

        let user = self.resolve_contact(&normalize_contact(contact))?;
        if chat.has_member(user.id) {
            return Err(ValidationError::DuplicateMember.into());
        }
        if !self.db.add_chat_member(chat_id, user.id, &user.email)? {
            return Err(ValidationError::DuplicateMember.into());
        }

        info!(chat = %chat_id, member = %user.id.short(), "Member added");
        self.chat(chat_id)
    }

    /// Remove `member` from a group. A group cannot be emptied this way;
    /// delete it instead.
    pub async fn remove_member(&self, chat_id: ChatId, member: UserId) -> Result<Chat> {
        let actor = self.actor()?;
        let chat = self.chat(chat_id)?;
        self.require_membership_rights(&actor, &chat)?;

        if !chat.has_member(member) {
            return Err(ValidationError::NotAMember.into());
        }
        if chat.members.len() == 1 {
            return Err(ValidationError::LastMember.into());
        }
        if !self.db.remove_chat_member(chat_id, member)? {
            return Err(ValidationError::NotAMember.into());
        }

        info!(chat = %chat_id, member = %member.short(), "Member removed");
        self.chat(chat_id)
    }

    /// Delete every message in the chat but keep the chat.
    pub async fn clear_history(&self, chat_id: ChatId) -> Result<usize> {
        let actor = self.actor()?;
        let chat = self.chat(chat_id)?;
        if !authz::can_manage_chat(&actor, &chat) {
            return Err(ChatError::authorization("not allowed to clear this chat"));
        }

        let removed = self
            .db
            .clear_chat_messages(chat_id)
            .map_err(|e| super::not_found_as(e, format!("chat {chat_id}")))?;
        info!(chat = %chat_id, removed, "Chat history cleared");
        Ok(removed)
    }

    /// Delete the chat and all of its messages.
    pub async fn delete_chat(&self, chat_id: ChatId) -> Result<()> {
        let actor = self.actor()?;
        let chat = self.chat(chat_id)?;
        if !authz::can_manage_chat(&actor, &chat) {
            return Err(ChatError::authorization("not allowed to delete this chat"));
        }

        if !self.db.delete_chat_cascade(chat_id)? {
            return Err(ChatError::not_found(format!("chat {chat_id}")));
        }
        info!(chat = %chat_id, "Chat deleted");
        Ok(())
    }

    fn require_membership_rights(&self, actor: &User, chat: &Chat) -> Result<()> {
        if !authz::can_mutate_membership(actor, chat) {
            return Err(ChatError::authorization(
                "only the creator or an admin may change membership",
            ));
        }
        if !chat.is_group {
            return Err(ValidationError::DirectChatMembership.into());
        }
        Ok(())
    }

    fn resolve_contact(&self, contact: &str) -> Result<User> {
        self.db
            .find_user_by_email(contact)?
            .ok_or_else(|| ChatError::not_found(format!("no user registered as {contact}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{harness, stored_user};
    use tidings_shared::{MessageContent, Role};

    #[tokio::test]
    async fn direct_chat_between_two_users() {
        let h = harness();
        let a = stored_user(&h.db, "a@gmail.com", Role::Member);
        let b = stored_user(&h.db, "b@gmail.com", Role::Member);

        let chat = h.dispatcher(&a).create_direct_chat(" B@gmail.com ").await.unwrap();
        assert!(!chat.is_group);
        assert_eq!(chat.members, vec![a.id, b.id]);
        assert_eq!(chat.member_contacts, vec!["a@gmail.com", "b@gmail.com"]);
        assert_eq!(chat.last_message.as_deref(), Some(DIRECT_CHAT_GREETING));
        assert_eq!(chat.created_by, a.id);
    }

    #[tokio::test]
    async fn direct_chat_rules() {
        let h = harness();
        let a = stored_user(&h.db, "a@gmail.com", Role::Member);
        stored_user(&h.db, "b@gmail.com", Role::Member);
        let d = h.dispatcher(&a);

        assert_eq!(
            d.create_direct_chat("a@gmail.com").await.unwrap_err(),
            ChatError::Validation(ValidationError::SelfTarget)
        );
        assert!(matches!(
            d.create_direct_chat("nobody@gmail.com").await,
            Err(ChatError::NotFound(_))
        ));

        d.create_direct_chat("b@gmail.com").await.unwrap();
        assert_eq!(
            d.create_direct_chat("b@gmail.com").await.unwrap_err(),
            ChatError::Validation(ValidationError::DuplicateChat)
        );
    }

    #[tokio::test]
    async fn uniqueness_holds_from_either_side() {
        let h = harness();
        let a = stored_user(&h.db, "a@gmail.com", Role::Member);
        let b = stored_user(&h.db, "b@gmail.com", Role::Member);

        h.dispatcher(&a).create_direct_chat("b@gmail.com").await.unwrap();
        assert_eq!(
            h.dispatcher(&b).create_direct_chat("a@gmail.com").await.unwrap_err(),
            ChatError::Validation(ValidationError::DuplicateChat)
        );
        assert_eq!(h.db.chats_for_member(a.id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn group_skips_unknown_contacts() {
        let h = harness();
        let a = stored_user(&h.db, "a@gmail.com", Role::Member);
        let b = stored_user(&h.db, "b@gmail.com", Role::Member);
        let c = stored_user(&h.db, "c@gmail.com", Role::Member);

        let group = h
            .dispatcher(&a)
            .create_group(
                "Team",
                &[
                    "b@gmail.com".into(),
                    "ghost@gmail.com".into(),
                    "C@gmail.com".into(),
                    "a@gmail.com".into(),
                ],
            )
            .await
            .unwrap();
        assert!(group.is_group);
        assert_eq!(group.group_name.as_deref(), Some("Team"));
        assert_eq!(group.members, vec![a.id, b.id, c.id]);
        assert_eq!(group.members.len(), group.member_contacts.len());
        assert_eq!(group.last_message.as_deref(), Some(GROUP_CHAT_GREETING));
    }

    #[tokio::test]
    async fn group_needs_name_and_members() {
        let h = harness();
        let a = stored_user(&h.db, "a@gmail.com", Role::Member);
        let d = h.dispatcher(&a);

        assert_eq!(
            d.create_group("  ", &["b@gmail.com".into()]).await.unwrap_err(),
            ChatError::Validation(ValidationError::EmptyGroupName)
        );
        assert_eq!(
            d.create_group("Team", &["ghost@gmail.com".into()]).await.unwrap_err(),
            ChatError::Validation(ValidationError::NoGroupMembers)
        );
        assert!(h.db.chats_for_member(a.id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn membership_changes_keep_arrays_in_lockstep() {
        let h = harness();
        let a = stored_user(&h.db, "a@gmail.com", Role::Member);
        let b = stored_user(&h.db, "b@gmail.com", Role::Member);
        let c = stored_user(&h.db, "c@gmail.com", Role::Member);
        let d = h.dispatcher(&a);
        let group = d.create_group("Team", &["b@gmail.com".into()]).await.unwrap();

        let group = d.add_member(group.id, "c@gmail.com").await.unwrap();
        assert_eq!(group.members, vec![a.id, b.id, c.id]);
        assert_eq!(group.member_contacts[2], "c@gmail.com");

        assert_eq!(
            d.add_member(group.id, "c@gmail.com").await.unwrap_err(),
            ChatError::Validation(ValidationError::DuplicateMember)
        );

        let group = d.remove_member(group.id, b.id).await.unwrap();
        assert_eq!(group.members, vec![a.id, c.id]);
        assert_eq!(group.member_contacts, vec!["a@gmail.com", "c@gmail.com"]);

        assert_eq!(
            d.remove_member(group.id, b.id).await.unwrap_err(),
            ChatError::Validation(ValidationError::NotAMember)
        );
    }

    #[tokio::test]
    async fn last_member_cannot_be_removed() {
        let h = harness();
        let a = stored_user(&h.db, "a@gmail.com", Role::Member);
        let b = stored_user(&h.db, "b@gmail.com", Role::Member);
        let d = h.dispatcher(&a);
        let group = d.create_group("Team", &["b@gmail.com".into()]).await.unwrap();

        d.remove_member(group.id, b.id).await.unwrap();
        assert_eq!(
            d.remove_member(group.id, a.id).await.unwrap_err(),
            ChatError::Validation(ValidationError::LastMember)
        );
    }

    #[tokio::test]
    async fn only_creator_or_admin_changes_membership() {
        let h = harness();
        let a = stored_user(&h.db, "a@gmail.com", Role::Member);
        let b = stored_user(&h.db, "b@gmail.com", Role::Member);
        stored_user(&h.db, "c@gmail.com", Role::Member);
        let admin = stored_user(&h.db, "root@gmail.com", Role::Admin);
        let group = h
            .dispatcher(&a)
            .create_group("Team", &["b@gmail.com".into()])
            .await
            .unwrap();

        assert!(matches!(
            h.dispatcher(&b).add_member(group.id, "c@gmail.com").await,
            Err(ChatError::Authorization(_))
        ));
        assert_eq!(h.db.get_chat(group.id).unwrap().members.len(), 2);

        let group = h
            .dispatcher(&admin)
            .add_member(group.id, "c@gmail.com")
            .await
            .unwrap();
        assert_eq!(group.members.len(), 3);
    }

    #[tokio::test]
    async fn direct_chats_have_fixed_membership() {
        let h = harness();
        let a = stored_user(&h.db, "a@gmail.com", Role::Member);
        let b = stored_user(&h.db, "b@gmail.com", Role::Member);
        stored_user(&h.db, "c@gmail.com", Role::Member);
        let chat = h.direct_chat(&a, &b);

        assert_eq!(
            h.dispatcher(&a).add_member(chat.id, "c@gmail.com").await.unwrap_err(),
            ChatError::Validation(ValidationError::DirectChatMembership)
        );
    }

    #[tokio::test]
    async fn delete_chat_removes_messages_too() {
        let h = harness();
        let a = stored_user(&h.db, "a@gmail.com", Role::Member);
        let b = stored_user(&h.db, "b@gmail.com", Role::Member);
        let chat = h.direct_chat(&a, &b);
        let d = h.dispatcher(&a);
        for text in ["one", "two", "three"] {
            d.send_message(chat.id, MessageContent::text(text)).await.unwrap();
        }

        // the other participant of a direct chat may delete it as well
        h.dispatcher(&b).delete_chat(chat.id).await.unwrap();
        assert!(h.db.messages_for_chat(chat.id).unwrap().is_empty());
        assert!(matches!(
            d.delete_chat(chat.id).await,
            Err(ChatError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn group_member_cannot_delete_or_clear() {
        let h = harness();
        let a = stored_user(&h.db, "a@gmail.com", Role::Member);
        let b = stored_user(&h.db, "b@gmail.com", Role::Member);
        let group = h
            .dispatcher(&a)
            .create_group("Team", &["b@gmail.com".into()])
            .await
            .unwrap();

        let as_b = h.dispatcher(&b);
        assert!(matches!(as_b.delete_chat(group.id).await, Err(ChatError::Authorization(_))));
        assert!(matches!(as_b.clear_history(group.id).await, Err(ChatError::Authorization(_))));
        assert!(h.db.get_chat(group.id).is_ok());
    }

    #[tokio::test]
    async fn clear_history_keeps_the_chat() {
        let h = harness();
        let a = stored_user(&h.db, "a@gmail.com", Role::Member);
        let b = stored_user(&h.db, "b@gmail.com", Role::Member);
        let chat = h.direct_chat(&a, &b);
        let d = h.dispatcher(&a);
        d.send_message(chat.id, MessageContent::text("one")).await.unwrap();
        d.send_message(chat.id, MessageContent::text("two")).await.unwrap();

        assert_eq!(d.clear_history(chat.id).await.unwrap(), 2);
        let chat = h.db.get_chat(chat.id).unwrap();
        assert_eq!(chat.last_message.as_deref(), Some(""));
        assert!(h.db.messages_for_chat(chat.id).unwrap().is_empty());
    }
}
