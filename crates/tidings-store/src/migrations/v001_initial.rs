//! v001 -- Initial schema creation.
//!
//! Creates `users`, `chats`, `chat_members`, `messages`, and `requests`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id           TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    email        TEXT NOT NULL UNIQUE,
    display_name TEXT,
    avatar_ref   TEXT,
    role         TEXT NOT NULL DEFAULT 'member',
    is_approved  INTEGER NOT NULL DEFAULT 0,  -- boolean 0/1
    push_token   TEXT,
    location_lat REAL,
    location_lon REAL,
    location_at  TEXT,
    created_at   TEXT NOT NULL                -- RFC-3339, microseconds
);

CREATE INDEX IF NOT EXISTS idx_users_pending ON users(is_approved);

-- ----------------------------------------------------------------
-- Chats
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS chats (
    id                TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    is_group          INTEGER NOT NULL DEFAULT 0,
    group_name        TEXT,
    created_by        TEXT NOT NULL,              -- back-reference, not owned
    last_message      TEXT,
    last_message_time TEXT,
    created_at        TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Chat membership: one row per (member, contact) pair
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS chat_members (
    chat_id  TEXT NOT NULL,
    position INTEGER NOT NULL,
    user_id  TEXT NOT NULL,
    contact  TEXT NOT NULL,

    PRIMARY KEY (chat_id, user_id),
    FOREIGN KEY (chat_id) REFERENCES chats(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_chat_members_user ON chat_members(user_id);

-- ----------------------------------------------------------------
-- Messages
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    id          TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    chat_id     TEXT NOT NULL,              -- FK -> chats(id)
    sender_id   TEXT NOT NULL,
    sender_name TEXT NOT NULL,              -- snapshot at send time
    kind        TEXT NOT NULL,              -- text|image|audio|file|location
    text        TEXT,
    media_ref   TEXT,
    file_name   TEXT,
    latitude    REAL,
    longitude   REAL,
    created_at  TEXT NOT NULL,
    edited      INTEGER NOT NULL DEFAULT 0,

    FOREIGN KEY (chat_id) REFERENCES chats(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_messages_chat_ts
    ON messages(chat_id, created_at ASC);

-- ----------------------------------------------------------------
-- Membership requests (password-reset tickets)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS requests (
    id         TEXT PRIMARY KEY NOT NULL,
    email      TEXT NOT NULL,
    kind       TEXT NOT NULL DEFAULT 'password_reset',
    status     TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
