use crate::store::{MemberStore, TOP_CHATS_LIMIT};
use async_trait::async_trait;
use chrono::Utc;
use invite_models::{
    BotChat, BotError, ChatMemberRecord, MemberStatus, Statistics, TopChat, UserRecord,
};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// [`MemberStore`] kept in process memory. Used by tests and the `stats`
/// dry runs; nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<BTreeMap<i64, UserRecord>>,
    members: RwLock<BTreeMap<(i64, i64), ChatMemberRecord>>,
    chats: RwLock<BTreeMap<i64, BotChat>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user(&self, user_id: i64) -> Option<UserRecord> {
        self.users.read().await.get(&user_id).cloned()
    }

    pub async fn member(&self, chat_id: i64, user_id: i64) -> Option<ChatMemberRecord> {
        self.members.read().await.get(&(chat_id, user_id)).cloned()
    }

    pub async fn bot_chat(&self, chat_id: i64) -> Option<BotChat> {
        self.chats.read().await.get(&chat_id).cloned()
    }

    async fn non_bot_members(&self, chat_id: i64) -> Vec<i64> {
        let users = self.users.read().await;
        self.members
            .read()
            .await
            .range((chat_id, i64::MIN)..=(chat_id, i64::MAX))
            .filter(|(_, m)| users.get(&m.user_id).map(|u| !u.is_bot).unwrap_or(false))
            .map(|(_, m)| m.user_id)
            .collect()
    }
}

#[async_trait]
impl MemberStore for MemoryStore {
    async fn upsert_user(&self, user: &UserRecord) -> Result<(), BotError> {
        self.users.write().await.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn upsert_chat_member(
        &self,
        user_id: i64,
        chat_id: i64,
        status: MemberStatus,
    ) -> Result<(), BotError> {
        self.members.write().await.insert(
            (chat_id, user_id),
            ChatMemberRecord {
                user_id,
                chat_id,
                status,
                joined_date: Utc::now(),
            },
        );
        Ok(())
    }

    async fn remove_chat_member(&self, user_id: i64, chat_id: i64) -> Result<(), BotError> {
        self.members.write().await.remove(&(chat_id, user_id));
        Ok(())
    }

    async fn upsert_bot_chat(&self, chat: &BotChat) -> Result<(), BotError> {
        self.chats.write().await.insert(chat.chat_id, chat.clone());
        Ok(())
    }

    async fn remove_bot_chat(&self, chat_id: i64) -> Result<(), BotError> {
        self.chats.write().await.remove(&chat_id);
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<i64>, BotError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .filter(|u| !u.is_bot)
            .map(|u| u.user_id)
            .collect())
    }

    async fn list_chat_members(&self, chat_id: i64) -> Result<Vec<i64>, BotError> {
        Ok(self
            .members
            .read()
            .await
            .range((chat_id, i64::MIN)..=(chat_id, i64::MAX))
            .map(|(_, m)| m.user_id)
            .collect())
    }

    async fn list_audience(&self, target_chat_id: i64) -> Result<Vec<i64>, BotError> {
        Ok(self.non_bot_members(target_chat_id).await)
    }

    async fn list_bot_chats(&self) -> Result<Vec<BotChat>, BotError> {
        let mut chats: Vec<BotChat> = self.chats.read().await.values().cloned().collect();
        chats.sort_by(|a, b| a.title.cmp(&b.title).then(a.chat_id.cmp(&b.chat_id)));
        Ok(chats)
    }

    async fn statistics(&self, target_chat_id: i64) -> Result<Statistics, BotError> {
        let users_count = self.list_users().await?.len() as i64;
        let target_chat_members = self.list_chat_members(target_chat_id).await?.len() as i64;
        let audience_count = self.non_bot_members(target_chat_id).await.len() as i64;

        let chats = self.chats.read().await;
        let mut ranked: Vec<&BotChat> = chats.values().collect();
        ranked.sort_by(|a, b| {
            b.members_count
                .cmp(&a.members_count)
                .then(a.chat_id.cmp(&b.chat_id))
        });
        let top_chats = ranked
            .into_iter()
            .take(TOP_CHATS_LIMIT)
            .map(|c| TopChat {
                title: c.title.clone(),
                members_count: c.members_count,
            })
            .collect();

        Ok(Statistics {
            users_count,
            target_chat_members,
            audience_count,
            chats_count: chats.len() as i64,
            top_chats,
        })
    }
}
