//! The signed-in user's context.
//!
//! A [`Session`] is created on sign-in and handed to every component that
//! acts on behalf of the user. Nothing reads the current user from global
//! state.

use tidings_shared::UserId;
use tidings_store::User;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: UserId,
    contact: String,
}

impl Session {
    pub fn new(user: &User) -> Self {
        Self {
            user_id: user.id,
            contact: user.email.clone(),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Contact identifier of the signed-in user, used to pick the
    /// counterpart out of a direct chat's contacts.
    pub fn contact(&self) -> &str {
        &self.contact
    }
}
