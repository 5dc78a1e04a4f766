//! Record types persisted in the shared document store.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the presentation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tidings_shared::{ChatId, MessageContent, MessageId, RequestId, RequestStatus, Role, UserId};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// Last-known device location.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub recorded_at: DateTime<Utc>,
}

/// A registered user. Referenced by chats and messages, never owned by them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    /// Contact identifier used to address the user.
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_ref: Option<String>,
    pub role: Role,
    /// Flipped only by an admin.
    pub is_approved: bool,
    /// Notification delivery target (device push token).
    pub push_token: Option<String>,
    pub location: Option<Location>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// A conversation (direct or group).
///
/// `members` and `member_contacts` are parallel: entry `i` of one belongs to
/// entry `i` of the other.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: ChatId,
    pub members: Vec<UserId>,
    pub member_contacts: Vec<String>,
    pub is_group: bool,
    pub group_name: Option<String>,
    pub created_by: UserId,
    pub last_message: Option<String>,
    pub last_message_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Chat {
    pub fn has_member(&self, user: UserId) -> bool {
        self.members.contains(&user)
    }

    /// Contact stored for `user`, if they are a member.
    pub fn contact_of(&self, user: UserId) -> Option<&str> {
        self.members
            .iter()
            .position(|m| *m == user)
            .and_then(|i| self.member_contacts.get(i))
            .map(String::as_str)
    }
}

/// Field set for a chat about to be created.
#[derive(Debug, Clone)]
pub struct NewChat {
    /// `(member, contact)` pairs in display order.
    pub members: Vec<(UserId, String)>,
    pub is_group: bool,
    pub group_name: Option<String>,
    pub created_by: UserId,
    pub last_message: Option<String>,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    /// Owning chat. Never changes.
    pub chat_id: ChatId,
    /// Never changes.
    pub sender_id: UserId,
    /// Captured at send time; not updated when the sender renames.
    pub sender_display_name: String,
    pub content: MessageContent,
    /// Assigned by the store at insert. Never changes.
    pub created_at: DateTime<Utc>,
    pub edited: bool,
}

/// Field set for a message about to be inserted.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub sender_display_name: String,
    pub content: MessageContent,
}

// ---------------------------------------------------------------------------
// Membership request
// ---------------------------------------------------------------------------

/// Password-reset ticket. Created unauthenticated, closed by an admin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRequest {
    pub id: RequestId,
    pub email: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}
