use tracing::info;

use tidings_shared::Result;
use tidings_store::User;

use crate::commands::MutationDispatcher;

impl MutationDispatcher {
    /// Replace the signed-in user's display name and avatar. Blank values
    /// clear the field. Messages already sent keep their snapshot name.
    pub async fn update_profile(
        &self,
        display_name: Option<&str>,
        avatar_ref: Option<&str>,
    ) -> Result<User> {
        let actor = self.actor()?;
        let display_name = display_name.map(str::trim).filter(|s| !s.is_empty());
        let avatar_ref = avatar_ref.map(str::trim).filter(|s| !s.is_empty());

        self.db
            .update_user_profile(actor.id, display_name, avatar_ref)?;
        info!(user = %actor.id.short(), "Profile updated");
        self.actor()
    }

    /// Register (or clear, with `None`) this device's push delivery target.
    pub async fn set_delivery_target(&self, token: Option<&str>) -> Result<()> {
        let actor = self.actor()?;
        let token = token.map(str::trim).filter(|s| !s.is_empty());
        self.db.set_push_token(actor.id, token)?;
        info!(user = %actor.id.short(), registered = token.is_some(), "Delivery target updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::{harness, stored_user};
    use tidings_shared::Role;

    #[tokio::test]
    async fn profile_update_round_trips() {
        let h = harness();
        let a = stored_user(&h.db, "a@gmail.com", Role::Member);
        let d = h.dispatcher(&a);

        let user = d
            .update_profile(Some(" Alice "), Some("https://cdn.test/a.png"))
            .await
            .unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Alice"));
        assert_eq!(user.avatar_ref.as_deref(), Some("https://cdn.test/a.png"));

        let user = d.update_profile(Some(""), None).await.unwrap();
        assert_eq!(user.display_name, None);
    }

    #[tokio::test]
    async fn delivery_target_is_set_and_cleared() {
        let h = harness();
        let a = stored_user(&h.db, "a@gmail.com", Role::Member);
        let d = h.dispatcher(&a);

        d.set_delivery_target(Some("tok-a")).await.unwrap();
        assert_eq!(h.db.get_user(a.id).unwrap().push_token.as_deref(), Some("tok-a"));
        d.set_delivery_target(None).await.unwrap();
        assert_eq!(h.db.get_user(a.id).unwrap().push_token, None);
    }
}
