//! CRUD operations for [`User`] records.

use rusqlite::{params, OptionalExtension};
use tidings_shared::{Role, UserId};

use crate::changes::StoreChange;
use crate::database::Database;
use crate::error::Result;
use crate::models::{Location, User};
use crate::sql::{not_found, ts_from_sql, ts_to_sql, uuid_from_sql};

const USER_COLUMNS: &str = "id, email, display_name, avatar_ref, role, is_approved, push_token,
     location_lat, location_lon, location_at, created_at";

impl Database {
    pub fn insert_user(&self, user: &User) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO users (id, email, display_name, avatar_ref, role, is_approved, push_token,
                                location_lat, location_lon, location_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                user.id.to_string(),
                user.email,
                user.display_name,
                user.avatar_ref,
                user.role.as_str(),
                user.is_approved,
                user.push_token,
                user.location.map(|l| l.latitude),
                user.location.map(|l| l.longitude),
                user.location.map(|l| ts_to_sql(&l.recorded_at)),
                ts_to_sql(&user.created_at),
            ],
        )?;
        self.publish(StoreChange::Users);
        Ok(())
    }

    pub fn get_user(&self, id: UserId) -> Result<User> {
        self.conn()?
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id.to_string()],
                row_to_user,
            )
            .map_err(not_found)
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = self
            .conn()?
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Users waiting for admin approval, oldest first.
    pub fn list_pending_users(&self) -> Result<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE is_approved = 0 ORDER BY created_at ASC"
        ))?;
        let rows = stmt.query_map([], row_to_user)?;
        let users = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    pub fn set_user_approved(&self, id: UserId, approved: bool) -> Result<bool> {
        let affected = self.conn()?.execute(
            "UPDATE users SET is_approved = ?1 WHERE id = ?2",
            params![approved, id.to_string()],
        )?;
        self.publish_if(affected > 0, StoreChange::Users);
        Ok(affected > 0)
    }

    pub fn set_user_role(&self, id: UserId, role: Role) -> Result<bool> {
        let affected = self.conn()?.execute(
            "UPDATE users SET role = ?1 WHERE id = ?2",
            params![role.as_str(), id.to_string()],
        )?;
        self.publish_if(affected > 0, StoreChange::Users);
        Ok(affected > 0)
    }

    pub fn update_user_profile(
        &self,
        id: UserId,
        display_name: Option<&str>,
        avatar_ref: Option<&str>,
    ) -> Result<bool> {
        let affected = self.conn()?.execute(
            "UPDATE users SET display_name = ?1, avatar_ref = ?2 WHERE id = ?3",
            params![display_name, avatar_ref, id.to_string()],
        )?;
        self.publish_if(affected > 0, StoreChange::Users);
        Ok(affected > 0)
    }

    pub fn set_push_token(&self, id: UserId, token: Option<&str>) -> Result<bool> {
        let affected = self.conn()?.execute(
            "UPDATE users SET push_token = ?1 WHERE id = ?2",
            params![token, id.to_string()],
        )?;
        self.publish_if(affected > 0, StoreChange::Users);
        Ok(affected > 0)
    }

    /// Hard delete. Chats and messages keep their back-references.
    pub fn delete_user(&self, id: UserId) -> Result<bool> {
        let affected = self
            .conn()?
            .execute("DELETE FROM users WHERE id = ?1", params![id.to_string()])?;
        self.publish_if(affected > 0, StoreChange::Users);
        Ok(affected > 0)
    }

    pub(crate) fn publish_if(&self, changed: bool, change: StoreChange) {
        if changed {
            self.publish(change);
        }
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id_str: String = row.get(0)?;
    let role_str: String = row.get(4)?;
    let lat: Option<f64> = row.get(7)?;
    let lon: Option<f64> = row.get(8)?;
    let loc_str: Option<String> = row.get(9)?;
    let created_str: String = row.get(10)?;

    let location = match (lat, lon, loc_str) {
        (Some(latitude), Some(longitude), Some(ts)) => Some(Location {
            latitude,
            longitude,
            recorded_at: ts_from_sql(9, &ts)?,
        }),
        _ => None,
    };

    Ok(User {
        id: UserId(uuid_from_sql(0, &id_str)?),
        email: row.get(1)?,
        display_name: row.get(2)?,
        avatar_ref: row.get(3)?,
        role: Role::from_str_lossy(&role_str),
        is_approved: row.get(5)?,
        push_token: row.get(6)?,
        location,
        created_at: ts_from_sql(10, &created_str)?,
    })
}
