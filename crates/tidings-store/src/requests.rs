//! Membership (password-reset) request tickets.

use rusqlite::params;
use tidings_shared::{RequestId, RequestStatus};

use crate::changes::StoreChange;
use crate::database::Database;
use crate::error::Result;
use crate::models::MembershipRequest;
use crate::sql::{not_found, ts_from_sql, ts_to_sql, uuid_from_sql};

impl Database {
    pub fn insert_request(&self, email: &str) -> Result<MembershipRequest> {
        let request = MembershipRequest {
            id: RequestId::new(),
            email: email.to_string(),
            status: RequestStatus::Pending,
            created_at: self.next_timestamp()?,
        };
        self.conn()?.execute(
            "INSERT INTO requests (id, email, kind, status, created_at)
             VALUES (?1, ?2, 'password_reset', ?3, ?4)",
            params![
                request.id.to_string(),
                request.email,
                request.status.as_str(),
                ts_to_sql(&request.created_at),
            ],
        )?;
        self.publish(StoreChange::Requests);
        Ok(request)
    }

    pub fn get_request(&self, id: RequestId) -> Result<MembershipRequest> {
        self.conn()?
            .query_row(
                "SELECT id, email, status, created_at FROM requests WHERE id = ?1",
                params![id.to_string()],
                row_to_request,
            )
            .map_err(not_found)
    }

    pub fn list_pending_requests(&self) -> Result<Vec<MembershipRequest>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, email, status, created_at FROM requests
             WHERE status = 'pending' ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map([], row_to_request)?;
        let requests = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(requests)
    }

    /// Mark a ticket completed. Returns `false` if it was not pending.
    pub fn close_request(&self, id: RequestId) -> Result<bool> {
        let affected = self.conn()?.execute(
            "UPDATE requests SET status = 'completed' WHERE id = ?1 AND status = 'pending'",
            params![id.to_string()],
        )?;
        self.publish_if(affected > 0, StoreChange::Requests);
        Ok(affected > 0)
    }
}

fn row_to_request(row: &rusqlite::Row<'_>) -> rusqlite::Result<MembershipRequest> {
    let id_str: String = row.get(0)?;
    let status: String = row.get(2)?;
    let created_str: String = row.get(3)?;

    Ok(MembershipRequest {
        id: RequestId(uuid_from_sql(0, &id_str)?),
        email: row.get(1)?,
        status: RequestStatus::from_str_lossy(&status),
        created_at: ts_from_sql(3, &created_str)?,
    })
}
