use crate::store::MemberStore;
use invite_metrics::TracingService;
use invite_models::{BotChat, BotError, RefreshReport};
use invite_telegram::{Chat, TelegramApi};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

/// Chats the bot currently sits in, keyed by chat id.
///
/// Storage is the durable copy; the registry is what broadcasts and the chat
/// picker read from, rebuilt by [`ChatRegistry::refresh`].
#[derive(Default)]
pub struct ChatRegistry {
    chats: RwLock<BTreeMap<i64, BotChat>>,
}

impl ChatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry contents ordered by title, then id.
    pub async fn snapshot(&self) -> Vec<BotChat> {
        let mut chats: Vec<BotChat> = self.chats.read().await.values().cloned().collect();
        chats.sort_by(|a, b| a.title.cmp(&b.title).then(a.chat_id.cmp(&b.chat_id)));
        chats
    }

    pub async fn chat_ids(&self) -> Vec<i64> {
        self.chats.read().await.keys().copied().collect()
    }

    pub async fn get(&self, chat_id: i64) -> Option<BotChat> {
        self.chats.read().await.get(&chat_id).cloned()
    }

    pub async fn contains(&self, chat_id: i64) -> bool {
        self.chats.read().await.contains_key(&chat_id)
    }

    pub async fn len(&self) -> usize {
        self.chats.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.chats.read().await.is_empty()
    }

    pub async fn insert(&self, chat: BotChat) {
        self.chats.write().await.insert(chat.chat_id, chat);
    }

    /// Re-checks every stored chat against Telegram and replaces the registry
    /// with the chats the bot is still in.
    #[instrument(skip_all)]
    pub async fn refresh(
        &self,
        api: &dyn TelegramApi,
        store: &dyn MemberStore,
        bot_id: i64,
    ) -> Result<RefreshReport, BotError> {
        let stored = store.list_bot_chats().await?;
        let mut report = RefreshReport {
            chats_before: stored.len(),
            ..Default::default()
        };

        if stored.is_empty() {
            info!("No stored chats to refresh");
            self.chats.write().await.clear();
            return Ok(report);
        }

        let mut refreshed = BTreeMap::new();
        for known in stored {
            let chat_id = known.chat_id;

            let chat = match api.get_chat(chat_id).await {
                Ok(chat) => chat,
                Err(e) if e.is_gone() => {
                    store.remove_bot_chat(chat_id).await?;
                    report.removed += 1;
                    TracingService::log_chat_removed(chat_id, &e.to_string());
                    continue;
                }
                Err(e) => {
                    warn!(chat_id = chat_id, error = %e, "Chat unavailable, skipping");
                    continue;
                }
            };

            match api.get_chat_member(chat_id, bot_id).await {
                Ok(me) if me.status.has_left() => {
                    store.remove_bot_chat(chat_id).await?;
                    report.removed += 1;
                    TracingService::log_chat_removed(chat_id, &format!("bot status is {}", me.status));
                }
                Ok(_) => {
                    let members_count = if chat.kind.is_group() {
                        match api.get_chat_member_count(chat_id).await {
                            Ok(count) => count as i32,
                            Err(e) => {
                                warn!(chat_id = chat_id, error = %e, "Cannot read member count, keeping stored value");
                                known.members_count
                            }
                        }
                    } else {
                        0
                    };

                    let updated = chat.to_bot_chat(members_count);
                    store.upsert_bot_chat(&updated).await?;
                    refreshed.insert(chat_id, updated);
                }
                Err(e) if e.is_gone() => {
                    store.remove_bot_chat(chat_id).await?;
                    report.removed += 1;
                    TracingService::log_chat_removed(chat_id, &e.to_string());
                }
                Err(e) => {
                    warn!(chat_id = chat_id, error = %e, "Cannot check bot status, keeping stored chat");
                    refreshed.insert(chat_id, known);
                }
            }
        }

        report.chats_after = refreshed.len();
        *self.chats.write().await = refreshed;

        TracingService::log_refresh_completed(&report);
        Ok(report)
    }

    /// Stores a group chat seen in an update. Failures are logged; the caller
    /// keeps handling the update.
    pub async fn record_chat(
        &self,
        api: &dyn TelegramApi,
        store: &dyn MemberStore,
        chat: &Chat,
    ) -> Option<BotChat> {
        if !chat.kind.is_group() {
            return None;
        }

        let result: Result<BotChat, BotError> = async {
            let members_count = api.get_chat_member_count(chat.id).await?;
            let record = chat.to_bot_chat(members_count as i32);
            store.upsert_bot_chat(&record).await?;
            Ok(record)
        }
        .await;

        match result {
            Ok(record) => {
                self.insert(record.clone()).await;
                TracingService::log_chat_recorded(&record);
                Some(record)
            }
            Err(e) => {
                warn!(chat_id = chat.id, error = %e, "Cannot update chat info");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invite_models::ChatKind;

    fn chat(id: i64, title: &str) -> BotChat {
        BotChat::new(id, Some(title), ChatKind::Supergroup, 10)
    }

    #[tokio::test]
    async fn snapshot_orders_by_title() {
        let registry = ChatRegistry::new();
        registry.insert(chat(-3, "Zeta")).await;
        registry.insert(chat(-1, "Alpha")).await;
        registry.insert(chat(-2, "Alpha")).await;

        let ids: Vec<i64> = registry.snapshot().await.iter().map(|c| c.chat_id).collect();
        assert_eq!(ids, vec![-2, -1, -3]);
        assert_eq!(registry.len().await, 3);
        assert!(registry.contains(-3).await);
    }
}
