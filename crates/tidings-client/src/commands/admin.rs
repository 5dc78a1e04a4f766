//! Operations restricted to admins: the approval queue and request tickets.

use tracing::info;

use tidings_shared::{ChatError, RequestId, Result, UserId, ValidationError};
use tidings_store::{MembershipRequest, User};

use crate::commands::MutationDispatcher;

impl MutationDispatcher {
    fn require_admin(&self) -> Result<User> {
        let actor = self.actor()?;
        if !actor.is_admin() {
            return Err(ChatError::authorization("admin role required"));
        }
        Ok(actor)
    }

    /// Registered users still waiting for approval, oldest first.
    pub async fn pending_users(&self) -> Result<Vec<User>> {
        self.require_admin()?;
        Ok(self.db.list_pending_users()?)
    }

    pub async fn approve_user(&self, user_id: UserId) -> Result<()> {
        self.require_admin()?;
        if !self.db.set_user_approved(user_id, true)? {
            return Err(ChatError::not_found(format!("user {user_id}")));
        }
        info!(user = %user_id.short(), "User approved");
        Ok(())
    }

    /// Reject a registration by deleting the user record.
    pub async fn reject_user(&self, user_id: UserId) -> Result<()> {
        let admin = self.require_admin()?;
        if admin.id == user_id {
            return Err(ValidationError::SelfTarget.into());
        }
        if !self.db.delete_user(user_id)? {
            return Err(ChatError::not_found(format!("user {user_id}")));
        }
        info!(user = %user_id.short(), "User rejected");
        Ok(())
    }

    pub async fn pending_requests(&self) -> Result<Vec<MembershipRequest>> {
        self.require_admin()?;
        Ok(self.db.list_pending_requests()?)
    }

    /// Mark a request ticket as handled.
    pub async fn close_request(&self, request_id: RequestId) -> Result<()> {
        self.require_admin()?;
        if !self.db.close_request(request_id)? {
            return Err(ChatError::not_found(format!("request {request_id}")));
        }
        info!(request = %request_id, "Request closed");
        Ok(())
    }
}
