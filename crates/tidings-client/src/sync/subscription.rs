use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use tidings_shared::Result;
use tidings_store::{Database, StoreChange};

/// A cancelable standing query.
///
/// Holds the latest snapshot in a `watch` channel fed by a background task.
/// Must be created from within a tokio runtime. Dropping the handle releases
/// the task.
pub struct LiveSubscription<T> {
    snapshots: watch::Receiver<T>,
    task: Option<JoinHandle<()>>,
}

impl<T> LiveSubscription<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Run `query` now for the initial snapshot, then again after every
    /// change for which `relevant` returns true.
    pub(crate) fn spawn<Q, R>(db: Arc<Database>, label: &'static str, relevant: R, query: Q) -> Result<Self>
    where
        Q: Fn(&Database) -> Result<T> + Send + 'static,
        R: Fn(&StoreChange) -> bool + Send + 'static,
    {
        // subscribe before the first query so no write falls in between
        let mut changes = db.subscribe_changes();
        let initial = query(&db)?;
        let (tx, rx) = watch::channel(initial);

        let task = tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) if !relevant(&change) => continue,
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(label, skipped, "change feed lagged, re-querying");
                    }
                    Err(RecvError::Closed) => break,
                }

                match query(&db) {
                    Ok(snapshot) => {
                        if tx.send(snapshot).is_err() {
                            break;
                        }
                        debug!(label, "snapshot delivered");
                    }
                    Err(e) => warn!(label, error = %e, "snapshot query failed"),
                }
            }
        });

        Ok(Self {
            snapshots: rx,
            task: Some(task),
        })
    }

    /// Latest snapshot.
    pub fn current(&self) -> T {
        self.snapshots.borrow().clone()
    }

    /// Wait for the next snapshot. Returns `false` once the subscription has
    /// been released.
    pub async fn changed(&mut self) -> bool {
        if self.task.is_none() {
            return false;
        }
        self.snapshots.changed().await.is_ok()
    }

    /// Independent receiver for presentation code that wants its own handle.
    pub fn receiver(&self) -> watch::Receiver<T> {
        self.snapshots.clone()
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the background task. Calling it again is a no-op.
    pub fn unsubscribe(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<T> Drop for LiveSubscription<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
