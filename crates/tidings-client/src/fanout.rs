//! Best-effort notification fanout.
//!
//! After a successful send, every chat member except the sender gets one
//! independent dispatch attempt. A member without a delivery target is
//! skipped; a failed attempt is logged and dropped. Nothing here is retried
//! and nothing escalates to the caller.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use tidings_shared::constants::NOTIFY_PATH;
use tidings_shared::{ChatId, UserId};
use tidings_store::Database;

/// Body POSTed to the notification backend.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DispatchRequest {
    pub target: String,
    pub title: String,
    pub body: String,
    pub data: DispatchContext,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DispatchContext {
    pub chat_id: String,
}

/// Outcome counts of one fanout. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutSummary {
    /// Members with a delivery target that got a request.
    pub attempted: usize,
    /// Requests the backend answered with 2xx.
    pub delivered: usize,
    /// Members with no delivery target (or no user record).
    pub skipped: usize,
}

pub struct NotificationFanout {
    db: Arc<Database>,
    http: reqwest::Client,
    endpoint: String,
}

impl NotificationFanout {
    /// `base_url` is the notification backend root; requests go to
    /// `{base_url}/send-notification`.
    pub fn new(db: Arc<Database>, http: reqwest::Client, base_url: &str) -> Self {
        Self {
            db,
            http,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), NOTIFY_PATH),
        }
    }

    /// Notify every member of `chat_id` except `sender`.
    pub async fn notify(
        &self,
        chat_id: ChatId,
        sender: UserId,
        title: &str,
        body: &str,
    ) -> FanoutSummary {
        let mut summary = FanoutSummary::default();

        let chat = match self.db.get_chat(chat_id) {
            Ok(chat) => chat,
            Err(e) => {
                warn!(chat = %chat_id, error = %e, "fanout: cannot resolve chat members");
                return summary;
            }
        };

        let mut requests = Vec::new();
        for member in chat.members.iter().copied().filter(|m| *m != sender) {
            let target = match self.db.get_user(member) {
                Ok(user) => user.push_token.filter(|t| !t.is_empty()),
                Err(e) => {
                    debug!(member = %member, error = %e, "fanout: member lookup failed");
                    None
                }
            };
            match target {
                Some(target) => requests.push((
                    member,
                    DispatchRequest {
                        target,
                        title: title.to_string(),
                        body: body.to_string(),
                        data: DispatchContext {
                            chat_id: chat_id.to_string(),
                        },
                    },
                )),
                None => summary.skipped += 1,
            }
        }

        summary.attempted = requests.len();
        let outcomes = join_all(
            requests
                .iter()
                .map(|(member, req)| self.dispatch(*member, req)),
        )
        .await;
        summary.delivered = outcomes.into_iter().filter(|ok| *ok).count();

        info!(
            chat = %chat_id,
            attempted = summary.attempted,
            delivered = summary.delivered,
            skipped = summary.skipped,
            "notification fanout finished"
        );
        summary
    }

    async fn dispatch(&self, member: UserId, req: &DispatchRequest) -> bool {
        match self.http.post(&self.endpoint).json(req).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                warn!(member = %member, status = %resp.status(), "notification rejected");
                false
            }
            Err(e) => {
                warn!(member = %member, error = %e, "notification dispatch failed");
                false
            }
        }
    }
}
