//! Live views over the document store.
//!
//! Each view is a standing subscription: it takes an initial snapshot, then
//! re-queries whenever the store's change feed reports a relevant write and
//! publishes the full replacement snapshot.

pub mod chat_index;
pub mod message_stream;
pub mod subscription;

pub use chat_index::{filter_chats, ChatIndexSync, ChatView};
pub use message_stream::MessageStreamSync;
pub use subscription::LiveSubscription;
