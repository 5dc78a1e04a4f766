//! In-process change feed.
//!
//! Writers publish a coarse [`StoreChange`] after commit; subscribers treat
//! it as "something in this collection moved" and re-query. A lagged
//! receiver loses nothing it cannot recover by re-querying.

use tidings_shared::ChatId;
use tokio::sync::broadcast;

use crate::database::Database;

/// Capacity of the broadcast channel backing the change feed.
pub const CHANGE_FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    Users,
    Chats,
    Messages { chat_id: ChatId },
    Requests,
}

impl Database {
    /// Register a new receiver on the change feed.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    pub(crate) fn publish(&self, change: StoreChange) {
        // no receivers is not an error
        let receivers = self.changes.send(change).unwrap_or(0);
        tracing::trace!(?change, receivers, "store change published");
    }
}
