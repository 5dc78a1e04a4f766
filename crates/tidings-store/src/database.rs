//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations are run before any other operation. The connection sits behind
//! a mutex so a single handle can be shared (`Arc<Database>`) between the
//! mutation dispatcher and the live subscription tasks.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, DurationRound, Utc};
use directories::ProjectDirs;
use rusqlite::Connection;
use tokio::sync::broadcast;

use crate::changes::{StoreChange, CHANGE_FEED_CAPACITY};
use crate::error::{Result, StoreError};
use crate::migrations;

/// Wrapper around a [`rusqlite::Connection`] plus its change feed.
pub struct Database {
    conn: Mutex<Connection>,
    pub(crate) changes: broadcast::Sender<StoreChange>,
    last_timestamp: Mutex<DateTime<Utc>>,
}

impl Database {
    /// Open (or create) the default application database.
    ///
    /// The database file is placed in the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/tidings/tidings.db`
    /// - macOS:   `~/Library/Application Support/org.tidings.tidings/tidings.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\tidings\tidings\data\tidings.db`
    pub fn open_default() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("org", "tidings", "tidings").ok_or(StoreError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join("tidings.db");

        tracing::info!(path = %db_path.display(), "opening database");

        Self::open_at(&db_path)
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database. Mostly useful for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run_migrations(&conn)?;

        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);

        Ok(Self {
            conn: Mutex::new(conn),
            changes,
            last_timestamp: Mutex::new(DateTime::<Utc>::MIN_UTC),
        })
    }

    /// Lock the underlying connection.
    ///
    /// Callers should prefer the typed CRUD helpers, but direct access is
    /// occasionally needed for ad-hoc queries.
    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn()
            .ok()
            .and_then(|c| c.path().filter(|p| !p.is_empty()).map(PathBuf::from))
    }

    /// Server-assigned creation time.
    ///
    /// Strictly increasing for the lifetime of this handle, at microsecond
    /// resolution, so ordering by `created_at` is total.
    pub fn next_timestamp(&self) -> Result<DateTime<Utc>> {
        let mut last = self
            .last_timestamp
            .lock()
            .map_err(|_| StoreError::LockPoisoned)?;
        let now = Utc::now();
        let now = now.duration_trunc(Duration::microseconds(1)).unwrap_or(now);
        let next = if now > *last {
            now
        } else {
            *last + Duration::microseconds(1)
        };
        *last = next;
        Ok(next)
    }
}
