//! # tidings-store
//!
//! Shared document store for Tidings, backed by SQLite.
//!
//! The crate exposes a [`Database`] handle that wraps a `rusqlite::Connection`
//! behind a mutex, provides typed CRUD helpers for every record kind, and
//! publishes a [`StoreChange`] on an in-process broadcast feed after every
//! successful write so that live subscriptions can re-query.

pub mod changes;
pub mod chats;
pub mod database;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod requests;
pub mod users;

mod error;
mod sql;

#[cfg(test)]
mod fixtures;

pub use changes::StoreChange;
pub use database::Database;
pub use error::StoreError;
pub use models::*;
