//! # tidings-shared
//!
//! Domain vocabulary shared by the store and the client: typed identifiers,
//! message payloads, the error taxonomy, and protocol constants.

pub mod constants;
pub mod content;
pub mod error;
pub mod types;

pub use content::{MediaKind, MessageContent};
pub use error::{ChatError, Result, ValidationError};
pub use types::{ChatId, MessageId, RequestId, Role, RequestStatus, UserId};
