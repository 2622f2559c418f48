use crate::store::MemberStore;
use async_trait::async_trait;
use invite_metrics::TracingService;
use invite_models::{BotError, ChatKind, SyncReport};
use invite_telegram::TelegramApi;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, instrument, warn};

/// Receives human-readable progress lines while a long job runs.
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    async fn report(&self, line: &str);
}

/// Discards progress.
pub struct NoProgress;

#[async_trait]
impl ProgressReporter for NoProgress {
    async fn report(&self, _line: &str) {}
}

/// Reconciles stored target chat membership with what Telegram reports.
pub struct MemberSync {
    api: Arc<dyn TelegramApi>,
    store: Arc<dyn MemberStore>,
    target_chat_id: i64,
    check_delay: Duration,
}

impl MemberSync {
    pub fn new(
        api: Arc<dyn TelegramApi>,
        store: Arc<dyn MemberStore>,
        target_chat_id: i64,
        check_delay: Duration,
    ) -> Self {
        Self {
            api,
            store,
            target_chat_id,
            check_delay,
        }
    }

    #[instrument(skip_all, fields(chat_id = self.target_chat_id))]
    pub async fn run(&self, progress: &dyn ProgressReporter) -> Result<SyncReport, BotError> {
        let chat_id = self.target_chat_id;
        progress.report("🔄 Fetching chat member list...").await;

        let chat = match self.api.get_chat(chat_id).await {
            Ok(chat) => chat,
            Err(e) => {
                error!(error = %e, "Cannot read target chat");
                progress.report(&format!("❌ Error checking chat: {}", e)).await;
                return Err(e);
            }
        };

        let mut current: HashSet<i64> = HashSet::new();

        // Administrators are visible even when the member list is not.
        if let Ok(admins) = self.api.get_chat_administrators(chat_id).await {
            current.extend(admins.iter().filter(|a| !a.user.is_bot).map(|a| a.user.id));
        }

        if chat.kind == ChatKind::Supergroup {
            match self.api.get_chat_member_count(chat_id).await {
                Ok(count) => {
                    progress
                        .report(&format!("📊 The chat has {} members", count))
                        .await;
                    self.store
                        .upsert_bot_chat(&chat.to_bot_chat(count as i32))
                        .await?;
                }
                Err(e) => warn!(error = %e, "Cannot read member count"),
            }
        }

        let stored = self.store.list_chat_members(chat_id).await?;
        progress
            .report(&format!("🔍 Checking {} members from the database...", stored.len()))
            .await;

        let mut removed_count = 0;
        for user_id in &stored {
            match self.api.get_chat_member(chat_id, *user_id).await {
                Ok(member) if member.status.has_left() => {
                    self.store.remove_chat_member(*user_id, chat_id).await?;
                    removed_count += 1;
                    TracingService::log_member_removed(chat_id, *user_id, member.status.as_str());
                }
                Ok(member) => {
                    self.store
                        .upsert_chat_member(*user_id, chat_id, member.status)
                        .await?;
                    current.insert(*user_id);
                }
                Err(e) => {
                    // Unreadable members are treated as gone.
                    self.store.remove_chat_member(*user_id, chat_id).await?;
                    removed_count += 1;
                    TracingService::log_member_removed(chat_id, *user_id, &e.to_string());
                }
            }

            if !self.check_delay.is_zero() {
                tokio::time::sleep(self.check_delay).await;
            }
        }

        progress
            .report(&format!(
                "✅ Sync finished. Inactive members removed: {}",
                removed_count
            ))
            .await;

        let report = SyncReport {
            removed_count,
            current_members: current.len(),
            db_members_before: stored.len(),
        };
        TracingService::log_sync_completed(chat_id, &report);
        Ok(report)
    }
}
