use async_trait::async_trait;
use invite_models::{BotChat, BotError, MemberStatus, Statistics, UserRecord};

/// Number of chats listed in [`Statistics::top_chats`].
pub const TOP_CHATS_LIMIT: usize = 5;

/// Persistence for users, chat memberships and the chats the bot is in.
///
/// Upserts overwrite the stored row. Lists are ordered: ids ascending, chats
/// by title then id.
#[async_trait]
pub trait MemberStore: Send + Sync + 'static {
    async fn upsert_user(&self, user: &UserRecord) -> Result<(), BotError>;

    /// Inserts or updates a membership; `joined_date` is reset on update.
    async fn upsert_chat_member(
        &self,
        user_id: i64,
        chat_id: i64,
        status: MemberStatus,
    ) -> Result<(), BotError>;

    async fn remove_chat_member(&self, user_id: i64, chat_id: i64) -> Result<(), BotError>;

    async fn upsert_bot_chat(&self, chat: &BotChat) -> Result<(), BotError>;

    async fn remove_bot_chat(&self, chat_id: i64) -> Result<(), BotError>;

    /// Ids of all non-bot users.
    async fn list_users(&self) -> Result<Vec<i64>, BotError>;

    async fn list_chat_members(&self, chat_id: i64) -> Result<Vec<i64>, BotError>;

    /// Members of the target chat that are known non-bot users.
    async fn list_audience(&self, target_chat_id: i64) -> Result<Vec<i64>, BotError>;

    async fn list_bot_chats(&self) -> Result<Vec<BotChat>, BotError>;

    async fn statistics(&self, target_chat_id: i64) -> Result<Statistics, BotError>;
}
