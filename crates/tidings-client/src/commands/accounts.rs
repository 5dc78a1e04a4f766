//! Operations that run without a session.

use tracing::info;

use tidings_shared::{Result, Role, UserId, ValidationError};
use tidings_store::{Database, MembershipRequest, User};

use crate::commands::normalize_contact;

fn checked_email(email: &str) -> Result<String> {
    let email = normalize_contact(email);
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(ValidationError::InvalidEmail.into()),
    }
}

/// Create the user record for a newly issued identity. New users are
/// members and cannot sign in until an admin approves them.
pub fn register_user(db: &Database, email: &str, display_name: Option<&str>) -> Result<User> {
    let email = checked_email(email)?;
    if db.find_user_by_email(&email)?.is_some() {
        return Err(ValidationError::DuplicateUser.into());
    }

    let user = User {
        id: UserId::new(),
        email,
        display_name: display_name
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        avatar_ref: None,
        role: Role::Member,
        is_approved: false,
        push_token: None,
        location: None,
        created_at: db.next_timestamp()?,
    };
    db.insert_user(&user)?;

    info!(user = %user.id.short(), "User registered; awaiting approval");
    Ok(user)
}

/// File a password-reset ticket for an admin to handle.
pub fn submit_password_reset(db: &Database, email: &str) -> Result<MembershipRequest> {
    let email = checked_email(email)?;
    let request = db.insert_request(&email)?;
    info!(request = %request.id, "Password reset requested");
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidings_shared::ChatError;

    #[test]
    fn registration_creates_unapproved_member() {
        let db = Database::open_in_memory().unwrap();
        let user = register_user(&db, " Carol@Gmail.com ", Some("Carol")).unwrap();
        assert_eq!(user.email, "carol@gmail.com");
        assert_eq!(user.role, Role::Member);
        assert!(!user.is_approved);
        assert_eq!(db.get_user(user.id).unwrap(), user);
    }

    #[test]
    fn registration_rejects_bad_and_duplicate_emails() {
        let db = Database::open_in_memory().unwrap();
        for bad in ["", "carol", "@gmail.com", "carol@localhost"] {
            assert_eq!(
                register_user(&db, bad, None).unwrap_err(),
                ChatError::Validation(ValidationError::InvalidEmail),
                "{bad:?}"
            );
        }
        register_user(&db, "carol@gmail.com", None).unwrap();
        assert_eq!(
            register_user(&db, "CAROL@gmail.com", None).unwrap_err(),
            ChatError::Validation(ValidationError::DuplicateUser)
        );
    }

    #[test]
    fn password_reset_files_pending_request() {
        let db = Database::open_in_memory().unwrap();
        let request = submit_password_reset(&db, "a@gmail.com").unwrap();
        assert_eq!(db.list_pending_requests().unwrap(), vec![request]);
    }
}
